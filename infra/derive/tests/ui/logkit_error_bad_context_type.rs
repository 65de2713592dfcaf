use logkit_derive::logkit_error;

#[logkit_error]
pub enum SinkError {
    Io { source: std::io::Error, context: Option<String> },
}

fn main() {}
