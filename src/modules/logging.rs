use std::error::Error;
use std::fs::OpenOptions;
use simplelog::*;

/// Reads a level name as given on the command line (`off`, `error` .. `trace`).
pub fn parse_level(level: &str) -> Result<LevelFilter, Box<dyn Error>> {
    level
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| format!("unknown log level `{level}`").into())
}

/// Appends RFC 3339 stamped log lines at `level` and above to `log_path`.
pub fn init_logger(log_path: &str, level: &str) -> Result<(), Box<dyn Error>> {
    WriteLogger::init(
        parse_level(level)?,
        ConfigBuilder::new()
            .set_time_format_rfc3339()
            .build(),
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?,
    )?;
    Ok(())
}
