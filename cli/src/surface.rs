use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use playpen_core::SessionSnapshot;
use playpen_core::StatusSurface;
use playpen_core::format_duration;

/// Status and session lines go to stderr, program output to stdout, so
/// piping the output of a run stays clean.
pub struct TerminalSurface;

impl StatusSurface for TerminalSurface {
    fn show_status(&self, message: &str, ok: bool) {
        if ok {
            eprintln!("{message}");
        } else {
            eprintln!("error: {message}");
        }
    }

    fn show_output(&self, output: &str, _rich: bool) {
        println!("{output}");
    }

    fn show_session(&self, session: Option<&SessionSnapshot>) {
        let Some(session) = session else {
            eprintln!("session: none");
            return;
        };
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        let age = (now - session.created_at).max(0.0) as u64;
        let idle = (now - session.last_used_at).max(0.0) as u64;
        eprintln!(
            "session: {} (age {}, idle {})",
            session.session_id,
            format_duration(age),
            format_duration(idle),
        );
        match &session.container {
            Some(container) => eprintln!(
                "container: {} [{}] up {}",
                container.id,
                container.status,
                format_duration(container.age_seconds.max(0.0) as u64),
            ),
            None => eprintln!("container: none"),
        }
    }
}
