/// Structured logging for the hydro dashboard
///
/// Provides context-rich logging with component identifiers,
/// timestamps, and severity levels. Supports both console output and
/// file-based logging for long-running deployments.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Imgw,
    Store,
    Report,
    Http,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Imgw => write!(f, "IMGW"),
            Component::Store => write!(f, "STORE"),
            Component::Report => write!(f, "REPORT"),
            Component::Http => write!(f, "HTTP"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - upstream maintenance window or throttling
    Expected,
    /// Unexpected failure - indicates service degradation or an API change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, component: &Component, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        format!("{} {} {}: {}", timestamp, level, component, message)
    }

    fn log(&self, level: LogLevel, component: &Component, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, component, message);

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}: {}", component, message),
                LogLevel::Warning => eprintln!("   ⚠ {}: {}", component, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &component, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, message: &str) {
    dispatch(LogLevel::Info, component, message);
}

/// Log a warning message
pub fn warn(component: Component, message: &str) {
    dispatch(LogLevel::Warning, component, message);
}

/// Log an error message
pub fn error(component: Component, message: &str) {
    dispatch(LogLevel::Error, component, message);
}

/// Log a debug message
pub fn debug(component: Component, message: &str) {
    dispatch(LogLevel::Debug, component, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify an IMGW fetch failure from its error message
pub fn classify_fetch_failure(error_message: &str) -> FailureType {
    // 429 and 503 are what IMGW serves while throttling or during maintenance
    if error_message.contains("HTTP error: 429") || error_message.contains("HTTP error: 503") {
        FailureType::Expected
    }
    // Other HTTP errors might indicate service issues
    else if error_message.contains("HTTP error") {
        FailureType::Unexpected
    }
    // Parse errors suggest API changes or bugs
    else if error_message.contains("Parse error") {
        FailureType::Unexpected
    }
    // Timeouts and connection resets come and go
    else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log an IMGW fetch failure with automatic classification
pub fn log_fetch_failure(operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_fetch_failure(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => warn(Component::Imgw, &message),
        FailureType::Unexpected => error(Component::Imgw, &message),
        FailureType::Unknown => warn(Component::Imgw, &message),
    }
}

// ---------------------------------------------------------------------------
// Refresh Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a completed refresh
pub fn log_refresh_summary(total: usize, with_level: usize) {
    let message = format!(
        "Refresh complete: {} stations, {} with a usable water level",
        total, with_level
    );

    if total == 0 {
        warn(Component::Imgw, &message);
    } else {
        info(Component::Imgw, &message);
    }
}
