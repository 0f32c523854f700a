/*!
Env-gated debug logging for probe invocations.

Disabled unless `PINGMON_DEBUG` is set to a truthy value, so the normal
probe path writes nothing. When enabled, entries go to
`~/.pingmon/pingmon-debug.log` as JSON lines with a per-process session
id for correlation; the file rotates into gzip archives once it grows
past the size cap. Messages are redacted before hitting disk because
env-resolved URLs can embed tokens.
*/

use std::collections::HashMap;
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Local;
use flate2::{write::GzEncoder, Compression};
use fs2::FileExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const LOG_ROTATION_SIZE_MB: u64 = 8;
const MAX_ARCHIVES: u32 = 5;
const ROTATION_CHECK_INTERVAL: u32 = 200;

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LogEntry {
    timestamp: String,
    level: String,
    component: String,
    event: String,
    message: String,
    correlation_id: Option<String>,
    fields: HashMap<String, serde_json::Value>,
}

struct RotatingLogger {
    log_path: PathBuf,
    write_count: AtomicU32,
}

impl RotatingLogger {
    fn new(log_path: PathBuf) -> Self {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        Self {
            log_path,
            write_count: AtomicU32::new(0),
        }
    }

    fn write_with_rotation(&self, json_line: &str) -> Result<(), std::io::Error> {
        // Rotation is checked every ROTATION_CHECK_INTERVAL writes, not
        // on every append.
        if self.write_count.fetch_add(1, Ordering::Relaxed) % ROTATION_CHECK_INTERVAL == 0 {
            let _ = self.rotate_if_needed();
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        writeln!(file, "{}", json_line)?;
        Ok(())
    }

    fn rotate_if_needed(&self) -> Result<(), std::io::Error> {
        if !self.needs_rotation()? {
            return Ok(());
        }

        // Lock so concurrent invocations cannot rotate simultaneously.
        let lock_path = self.log_path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => {
                if self.needs_rotation()? {
                    self.perform_rotation()?;
                }
                let _ = std::fs::remove_file(&lock_path);
                Ok(())
            }
            // Another process is rotating, skip this time.
            Err(_) => Ok(()),
        }
    }

    fn needs_rotation(&self) -> Result<bool, std::io::Error> {
        if !self.log_path.exists() {
            return Ok(false);
        }

        let metadata = std::fs::metadata(&self.log_path)?;
        Ok(metadata.len() >= LOG_ROTATION_SIZE_MB * 1024 * 1024)
    }

    fn perform_rotation(&self) -> Result<(), std::io::Error> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let base_name = match self.log_path.file_stem().and_then(|stem| stem.to_str()) {
            Some(name) => name.to_string(),
            None => return Ok(()),
        };
        let archive_path = match self.log_path.parent() {
            Some(dir) => dir.join(format!("{}.{}.gz", base_name, timestamp)),
            None => return Ok(()),
        };

        let temp_path = self.log_path.with_extension("rotating");
        std::fs::rename(&self.log_path, &temp_path)?;

        let source_file = File::open(&temp_path)?;
        let target_file = File::create(&archive_path)?;
        let mut encoder = GzEncoder::new(target_file, Compression::default());
        std::io::copy(&mut BufReader::new(source_file), &mut encoder)?;
        encoder.finish()?;

        std::fs::remove_file(&temp_path)?;

        let _ = self.cleanup_old_archives(&base_name);

        Ok(())
    }

    fn cleanup_old_archives(&self, base_name: &str) -> Result<(), std::io::Error> {
        let Some(log_dir) = self.log_path.parent() else {
            return Ok(());
        };

        let mut archives = Vec::new();
        for entry in std::fs::read_dir(log_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();

            if name.starts_with(&format!("{}.", base_name)) && name.ends_with(".gz") {
                archives.push((entry.path(), entry.metadata()?.modified()?));
            }
        }

        archives.sort_by_key(|(_, modified)| *modified);
        if archives.len() > MAX_ARCHIVES as usize {
            let to_remove = archives.len() - MAX_ARCHIVES as usize;
            for (path, _) in archives.iter().take(to_remove) {
                let _ = std::fs::remove_file(path);
            }
        }

        Ok(())
    }
}

pub struct DebugLogger {
    enabled: bool,
    rotating_logger: Option<Arc<Mutex<RotatingLogger>>>,
    session_id: String,
    redaction_patterns: Vec<Regex>,
}

impl DebugLogger {
    pub fn new() -> Self {
        let enabled = parse_debug_enabled();
        let session_id = Uuid::new_v4().to_string()[..8].to_string();

        let rotating_logger = if enabled {
            Some(Arc::new(Mutex::new(RotatingLogger::new(log_path()))))
        } else {
            None
        };

        Self {
            enabled,
            rotating_logger,
            session_id,
            redaction_patterns: compile_redaction_patterns(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn debug_sync(&self, component: &str, event: &str, message: &str) {
        self.log_sync("DEBUG", component, event, message, None, HashMap::new());
    }

    pub fn error_sync(&self, component: &str, event: &str, message: &str) {
        self.log_sync("ERROR", component, event, message, None, HashMap::new());
    }

    pub fn probe_start(
        &self,
        server_id: &str,
        server_type: &str,
        attempts: u32,
        correlation_id: String,
    ) {
        let mut fields = HashMap::new();
        fields.insert("server_id".to_string(), server_id.into());
        fields.insert("server_type".to_string(), server_type.into());
        fields.insert("attempts".to_string(), attempts.into());

        self.log_sync(
            "PROBE",
            "ProbeDriver",
            "probe_start",
            &format!("Probing {} ({} attempts)", server_id, attempts),
            Some(correlation_id),
            fields,
        );
    }

    pub fn probe_end(
        &self,
        server_id: &str,
        events: usize,
        successes: usize,
        duration_ms: u64,
        correlation_id: String,
    ) {
        let mut fields = HashMap::new();
        fields.insert("server_id".to_string(), server_id.into());
        fields.insert("events".to_string(), events.into());
        fields.insert("successes".to_string(), successes.into());
        fields.insert("duration_ms".to_string(), duration_ms.into());

        self.log_sync(
            "PROBE",
            "ProbeDriver",
            "probe_end",
            &format!(
                "Probe completed: {}/{} attempts succeeded ({}ms)",
                successes, events, duration_ms
            ),
            Some(correlation_id),
            fields,
        );
    }

    pub fn record_write_summary(&self, server_id: &str, record_type: &str, events: usize) {
        let mut fields = HashMap::new();
        fields.insert("server_id".to_string(), server_id.into());
        fields.insert("record_type".to_string(), record_type.into());
        fields.insert("events".to_string(), events.into());

        self.log_sync(
            "STORE",
            "RecordStore",
            "record_appended",
            &format!("Appended {} record for {}", record_type, server_id),
            None,
            fields,
        );
    }

    fn log_sync(
        &self,
        level: &str,
        component: &str,
        event: &str,
        message: &str,
        correlation_id: Option<String>,
        fields: HashMap<String, serde_json::Value>,
    ) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            level: level.to_string(),
            component: component.to_string(),
            event: event.to_string(),
            message: self.redact(message),
            correlation_id: correlation_id.or_else(|| Some(self.session_id.clone())),
            fields,
        };

        if let Some(logger) = &self.rotating_logger {
            if let Ok(logger) = logger.lock() {
                if let Ok(json_line) = serde_json::to_string(&entry) {
                    // Never crash the probe over a logging failure.
                    let _ = logger.write_with_rotation(&json_line);
                }
            }
        }
    }

    fn redact(&self, text: &str) -> String {
        let mut redacted = text.to_string();
        for regex in &self.redaction_patterns {
            redacted = regex.replace_all(&redacted, "[REDACTED]").to_string();
        }
        redacted
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Supports true/false, 1/0, yes/no, on/off (case insensitive);
/// anything else, including unset, is disabled.
fn parse_debug_enabled() -> bool {
    env::var("PINGMON_DEBUG")
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
        .unwrap_or(false)
}

fn log_path() -> PathBuf {
    let mut log_path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    log_path.push(".pingmon");
    log_path.push("pingmon-debug.log");
    log_path
}

fn compile_redaction_patterns() -> Vec<Regex> {
    let patterns = [
        r"(?i)authorization[:\s]+[^\s\n]+",
        r"(?i)bearer[:\s]+[^\s\n]+",
        r"(?i)token[:\s]+[^\s\n]+",
        r"(?i)password[:\s]+[^\s\n]+",
        r"(?i)api[_-]?key[:\s]+[^\s\n]+",
        r"(?i)secret[:\s]+[^\s\n]+",
    ];

    patterns
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
}

pub fn get_debug_logger() -> DebugLogger {
    DebugLogger::new()
}
