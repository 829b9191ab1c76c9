// Ports - Interface definitions (contracts)

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::SqueezeResult;

/// Port for the embedded transcoding engine, consumed as an opaque
/// capability set: load, virtual-file I/O, command execution, and an
/// out-of-band progress-ratio stream.
///
/// The engine owns a single virtual filesystem namespace shared by all
/// sessions; callers must use unique per-session file names.
#[async_trait]
pub trait EnginePort: Send + Sync {
    /// Initialize the engine. Idempotency is the wrapper's responsibility;
    /// callers go through the lifecycle manager rather than calling this
    /// directly.
    async fn load(&self) -> SqueezeResult<()>;

    /// Stage bytes into the engine's virtual filesystem
    async fn write_file(&self, name: &str, bytes: &[u8]) -> SqueezeResult<()>;

    /// Read bytes back out of the engine's virtual filesystem
    async fn read_file(&self, name: &str) -> SqueezeResult<Vec<u8>>;

    /// Remove a virtual file
    async fn unlink(&self, name: &str) -> SqueezeResult<()>;

    /// Execute one encode with the given argument sequence. Progress is
    /// reported out-of-band on the `progress` channel while this is
    /// pending.
    async fn run(&self, args: &[String]) -> SqueezeResult<()>;

    /// Subscribe to the engine's fractional completion ratio (0.0-1.0).
    /// Events arrive on no fixed cadence and may be approximate or late.
    fn progress(&self) -> watch::Receiver<f64>;
}
