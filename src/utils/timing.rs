use std::future::Future;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::info;

pub const TIMING_TARGET: &str = "prompt.timing";

#[derive(Debug)]
pub struct GenerationTimer {
    mode: String,
    style: String,
    panels: u32,
    text_chars: usize,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

impl GenerationTimer {
    pub fn start(mode: &str, style: &str, panels: u32, text: &str) -> Self {
        let timer = GenerationTimer {
            mode: mode.to_string(),
            style: style.to_string(),
            panels,
            text_chars: text.chars().count(),
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        };
        info!(
            target: TIMING_TARGET,
            "event=generation_started mode={} style={} panels={} text_chars={} started_at={}",
            timer.mode,
            timer.style,
            timer.panels,
            timer.text_chars,
            timer.started_at.to_rfc3339()
        );
        timer
    }

    pub fn mark_status(&mut self, status: &str, detail: Option<String>) {
        self.status = status.to_string();
        self.detail = detail;
    }

    pub fn complete(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: TIMING_TARGET,
            "event=generation_completed mode={} style={} panels={} completed_at={} duration_s={:.3} status={} detail={}",
            self.mode,
            self.style,
            self.panels,
            Utc::now().to_rfc3339(),
            duration,
            self.status,
            self.detail.clone().unwrap_or_default()
        );
    }
}

impl Drop for GenerationTimer {
    fn drop(&mut self) {
        self.complete();
    }
}

pub async fn log_llm_timing<T, E, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    call: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    info!(
        target: TIMING_TARGET,
        "event=llm_request provider={} model={} operation={} started_at={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339()
    );

    let result = call().await;
    let status = if result.is_ok() { "success" } else { "error" };

    info!(
        target: TIMING_TARGET,
        "event=llm_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={}",
        provider,
        model,
        operation,
        Utc::now().to_rfc3339(),
        started_perf.elapsed().as_secs_f64(),
        status
    );

    result
}
