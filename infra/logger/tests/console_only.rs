use herald_logger::{LevelFilter, Logger};

#[test]
fn console_only_logger_writes_no_files() {
    let logger = Logger::builder()
        .name("herald-console-only")
        .console(true)
        .filter("herald_event_bus=trace")
        .level(LevelFilter::INFO)
        .init()
        .expect("logger should initialize");

    assert_eq!(logger.name(), "herald-console-only");
    assert!(!logger.writes_files());
}
