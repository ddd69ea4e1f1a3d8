//! Operator controls: Ctrl-C and line commands on stdin.

use orgmaps_core::ControlSignals;
use std::io::BufRead;
use tracing::{info, warn};

/// A line command typed by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Stop,
    Captcha,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "pause" | "p" => Some(Self::Pause),
            "resume" | "r" => Some(Self::Resume),
            "stop" | "q" | "quit" => Some(Self::Stop),
            "captcha" | "c" => Some(Self::Captcha),
            _ => None,
        }
    }

    pub fn apply(self, signals: &ControlSignals) {
        match self {
            Self::Pause => {
                signals.pause();
                info!("Pause requested");
            }
            Self::Resume => {
                signals.resume();
                info!("Resume requested");
            }
            Self::Stop => {
                signals.stop();
                info!("Stop requested");
            }
            Self::Captcha => {
                signals.request_captcha_resume();
                info!("Captcha resume requested");
            }
        }
    }
}

/// Set stop on the first Ctrl-C.
pub fn spawn_ctrl_c(signals: ControlSignals) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current card");
            signals.stop();
        }
    });
}

/// Read commands from stdin on a dedicated thread.
///
/// The thread is never joined; it ends with the process.
pub fn spawn_stdin_commands(signals: ControlSignals) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match Command::parse(&line) {
                Some(command) => command.apply(&signals),
                None => warn!(
                    "Unknown command {:?} (use pause, resume, stop or captcha)",
                    line.trim()
                ),
            }
        }
    });
}
