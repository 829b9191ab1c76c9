// Scripted engine adapter - deterministic in-memory engine for tests
//
// Plays the same role the mock adapters do in the container wiring: a fully
// scriptable stand-in for the real engine capability, recording every
// write/unlink/run call for later assertions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::{SqueezeError, SqueezeResult};
use crate::ports::EnginePort;

/// In-memory engine with scripted outcomes and call recording
pub struct ScriptedEngine {
    files: Mutex<HashMap<String, Vec<u8>>>,
    write_log: Mutex<Vec<String>>,
    unlink_log: Mutex<Vec<String>>,
    run_log: Mutex<Vec<Vec<String>>>,
    load_calls: AtomicUsize,
    load_failure: Option<String>,
    load_delay: Duration,
    run_failure: Option<String>,
    run_progress: Vec<f64>,
    run_output: Vec<u8>,
    progress_tx: watch::Sender<f64>,
    progress_rx: watch::Receiver<f64>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        let (progress_tx, progress_rx) = watch::channel(0.0);
        Self {
            files: Mutex::new(HashMap::new()),
            write_log: Mutex::new(Vec::new()),
            unlink_log: Mutex::new(Vec::new()),
            run_log: Mutex::new(Vec::new()),
            load_calls: AtomicUsize::new(0),
            load_failure: None,
            load_delay: Duration::from_millis(0),
            run_failure: None,
            run_progress: vec![0.25, 0.5, 0.75, 1.0],
            run_output: vec![0u8; 4_000],
            progress_tx,
            progress_rx,
        }
    }

    /// Script `load` to fail with the given message
    pub fn with_failing_load(mut self, message: &str) -> Self {
        self.load_failure = Some(message.to_string());
        self
    }

    /// Delay `load` so concurrent callers overlap the Loading window
    pub fn with_load_delay_ms(mut self, millis: u64) -> Self {
        self.load_delay = Duration::from_millis(millis);
        self
    }

    /// Script `run` to fail mid-encode with the given message
    pub fn with_failing_run(mut self, message: &str) -> Self {
        self.run_failure = Some(message.to_string());
        self
    }

    /// Script the progress ratios `run` emits, in order
    pub fn with_run_progress(mut self, ratios: Vec<f64>) -> Self {
        self.run_progress = ratios;
        self
    }

    /// Script the bytes `run` produces at the output name
    pub fn with_run_output(mut self, bytes: Vec<u8>) -> Self {
        self.run_output = bytes;
        self
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    /// Names passed to `write_file`, in call order
    pub fn written_names(&self) -> Vec<String> {
        self.write_log.lock().unwrap().clone()
    }

    /// Names passed to `unlink`, in call order
    pub fn unlinked_names(&self) -> Vec<String> {
        self.unlink_log.lock().unwrap().clone()
    }

    /// Argument sequences passed to `run`, in call order
    pub fn run_invocations(&self) -> Vec<Vec<String>> {
        self.run_log.lock().unwrap().clone()
    }

    /// Whether a virtual file currently exists
    pub fn has_file(&self, name: &str) -> bool {
        self.files.lock().unwrap().contains_key(name)
    }

    fn input_name(args: &[String]) -> Option<String> {
        args.windows(2)
            .find(|w| w[0] == "-i")
            .map(|w| w[1].clone())
    }

    fn output_name(args: &[String]) -> Option<String> {
        args.last()
            .filter(|a| !a.starts_with('-'))
            .map(|a| a.to_string())
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnginePort for ScriptedEngine {
    async fn load(&self) -> SqueezeResult<()> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        match &self.load_failure {
            Some(message) => Err(SqueezeError::engine_load(message.clone())),
            None => Ok(()),
        }
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> SqueezeResult<()> {
        self.write_log.lock().unwrap().push(name.to_string());
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read_file(&self, name: &str) -> SqueezeResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| SqueezeError::encode(format!("no such virtual file: {}", name)))
    }

    async fn unlink(&self, name: &str) -> SqueezeResult<()> {
        self.unlink_log.lock().unwrap().push(name.to_string());
        self.files
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| SqueezeError::encode(format!("no such virtual file: {}", name)))
    }

    async fn run(&self, args: &[String]) -> SqueezeResult<()> {
        self.run_log.lock().unwrap().push(args.to_vec());

        let input = Self::input_name(args)
            .ok_or_else(|| SqueezeError::encode("run invoked without -i argument"))?;
        if !self.has_file(&input) {
            return Err(SqueezeError::encode(format!(
                "input not staged: {}",
                input
            )));
        }

        // Emit scripted progress with small gaps so observers wake per event
        for ratio in &self.run_progress {
            let _ = self.progress_tx.send(*ratio);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        if let Some(message) = &self.run_failure {
            return Err(SqueezeError::encode(message.clone()));
        }

        if let Some(output) = Self::output_name(args) {
            self.files
                .lock()
                .unwrap()
                .insert(output, self.run_output.clone());
        }
        Ok(())
    }

    fn progress(&self) -> watch::Receiver<f64> {
        self.progress_rx.clone()
    }
}
