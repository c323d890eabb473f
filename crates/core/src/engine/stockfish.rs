//! External UCI engine process
//!
//! Spawns Stockfish (or any UCI engine) as a subprocess and talks to it
//! over stdin/stdout.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use std::process::Stdio;
use tracing::debug;

use super::{Engine, EngineCommand};
use crate::error::{Error, Result};

/// Wrapper around a UCI engine subprocess
pub struct StockfishEngine {
    /// The child process
    process: Child,
    /// Stdin for sending commands
    stdin: ChildStdin,
    /// Stdout reader for receiving responses
    stdout: BufReader<ChildStdout>,
    /// Bytes of a line whose read was cut short by a timeout
    partial: Vec<u8>,
    /// A `go` is out and its `bestmove` has not been read yet
    searching: bool,
}

impl StockfishEngine {
    /// Starts the engine and completes the UCI handshake.
    ///
    /// # Arguments
    /// * `path` - Path to the engine binary (or "stockfish" if in PATH)
    ///
    /// # Example
    /// ```ignore
    /// let engine = StockfishEngine::spawn("stockfish").await?;
    /// ```
    pub async fn spawn(path: &str) -> Result<Self> {
        Self::spawn_command(path, &[]).await
    }

    /// Like [`spawn`](Self::spawn), with extra command-line arguments.
    pub async fn spawn_command(path: &str, args: &[&str]) -> Result<Self> {
        let mut process = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Engine(format!("failed to start {}: {}", path, e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| Error::Engine("failed to open stdin".into()))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| Error::Engine("failed to open stdout".into()))?;

        let mut engine = StockfishEngine {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            partial: Vec::new(),
            searching: false,
        };

        engine.init_uci().await?;
        Ok(engine)
    }

    async fn send_line(&mut self, cmd: &str) -> Result<()> {
        debug!(command = cmd, "to engine");
        self.stdin.write_all(cmd.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Reads one line. Bytes read before a cancellation stay in `partial`
    /// and are completed by the next call.
    async fn read_line(&mut self) -> Result<String> {
        let read = self.stdout.read_until(b'\n', &mut self.partial).await?;
        if read == 0 && self.partial.is_empty() {
            return Err(Error::Engine("engine closed its output".into()));
        }
        let line = String::from_utf8_lossy(&self.partial).trim().to_string();
        self.partial.clear();
        Ok(line)
    }

    /// Reads lines until one starts with `expected`, returning that line.
    async fn read_until(&mut self, expected: &str) -> Result<String> {
        loop {
            let line = self.read_line().await?;
            if line.starts_with(expected) {
                return Ok(line);
            }
        }
    }

    async fn init_uci(&mut self) -> Result<()> {
        self.send_line("uci").await?;
        self.read_until("uciok").await?;

        self.send_line("isready").await?;
        self.read_until("readyok").await?;
        Ok(())
    }
}

#[async_trait]
impl Engine for StockfishEngine {
    async fn send(&mut self, command: &EngineCommand) -> Result<()> {
        self.send_line(&command.to_string()).await?;
        if let EngineCommand::Go { .. } = command {
            self.searching = true;
        }
        Ok(())
    }

    /// Skips `info` lines until the `bestmove` answer.
    async fn read_reply(&mut self) -> Result<String> {
        let line = self.read_until("bestmove").await?;
        self.searching = false;
        Ok(line)
    }

    /// Stops an abandoned search and discards its `bestmove`.
    async fn resync(&mut self) -> Result<()> {
        if self.searching {
            debug!("draining abandoned search");
            self.send_line("stop").await?;
            self.read_until("bestmove").await?;
            self.searching = false;
        }
        Ok(())
    }

    async fn quit(&mut self) -> Result<()> {
        self.send_line("quit").await?;
        if let Err(e) = self.process.kill().await {
            debug!(error = %e, "engine already exited");
        }
        Ok(())
    }
}
