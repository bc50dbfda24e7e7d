//! Terminal front end for progress, notifications and the resume prompt

use std::io::{self, BufRead, Write};

use shared::{ProgressUpdate, ToastLevel};
use tracing::{error, info, warn};

use crate::traits::{Notifier, ResumeChoice, ResumeOffer};

/// How the resume question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePolicy {
    /// Prompt on stdin
    Ask,
    AlwaysResume,
    AlwaysDiscard,
}

pub struct ConsoleNotifier {
    policy: ResumePolicy,
}

impl ConsoleNotifier {
    pub fn new(policy: ResumePolicy) -> Self {
        Self { policy }
    }

    fn parse_answer(answer: &str) -> ResumeChoice {
        match answer.trim().to_lowercase().as_str() {
            "" | "y" | "yes" | "r" | "resume" => ResumeChoice::Resume,
            _ => ResumeChoice::Discard,
        }
    }

    fn ask(offer: &ResumeOffer) -> ResumeChoice {
        let mode = offer.mode.map(|m| m.to_string()).unwrap_or_else(|| "unknown".to_string());
        print!(
            "An interrupted {} run was found ({} of {} done, {:.0}%). Resume? [Y/n] ",
            mode, offer.generated_count, offer.total_to_generate, offer.progress
        );
        if io::stdout().flush().is_err() {
            return ResumeChoice::Discard;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => ResumeChoice::Discard,
            Ok(_) => Self::parse_answer(&answer),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn progress(&self, update: ProgressUpdate) {
        info!("📊 {:>5.1}% {}", update.percent, update.status);
    }

    fn toast(&self, level: ToastLevel, message: String) {
        match level {
            ToastLevel::Info => info!("ℹ️ {}", message),
            ToastLevel::Success => info!("✅ {}", message),
            ToastLevel::Warning => warn!("⚠️ {}", message),
            ToastLevel::Error => error!("❌ {}", message),
        }
    }

    fn modal(&self, message: String) {
        error!("🚫 {}", message);
        eprintln!("\n{message}\n");
    }

    fn confirm_resume(&self, offer: ResumeOffer) -> ResumeChoice {
        match self.policy {
            ResumePolicy::AlwaysResume => ResumeChoice::Resume,
            ResumePolicy::AlwaysDiscard => ResumeChoice::Discard,
            ResumePolicy::Ask => Self::ask(&offer),
        }
    }
}
