//! Profiling timers.

/// Start a named timer for a section of code.
#[macro_export]
macro_rules! time {
    ($label:ident) => {
        let mut $label = Some(::std::time::Instant::now());
    };
}

/// Stop a named timer and log how long the section took.
#[macro_export]
macro_rules! timeEnd {
    ($label:ident) => {{
        match $label.take() {
            Some(start) => tracing::debug!(
                "{} took {:.3}ms",
                stringify!($label),
                start.elapsed().as_secs_f64() * 1000.0
            ),
            None => tracing::warn!("timer `{}` already ended", stringify!($label)),
        };
    }};
}
