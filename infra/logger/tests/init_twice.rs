use logkit_logger::{Logger, LoggerError, LoggerSettings};

#[test]
fn second_global_logger_is_refused_with_its_name() {
    let settings = LoggerSettings { name: "first-global".to_owned(), ..LoggerSettings::default() };
    let first = settings.init().expect("the first logger becomes the process default");
    assert_eq!(first.name(), "first-global");

    let err = Logger::builder()
        .name("second-global")
        .console_writer(std::io::sink)
        .init()
        .expect_err("only one process-wide logger can be installed");

    assert!(matches!(err, LoggerError::Subscriber { context: Some(_), .. }), "got {err:?}");
    let message = err.to_string();
    assert!(
        message.starts_with("Tracing subscriber error (Installing logger 'second-global'): "),
        "got {message}"
    );
}
