use logkit_derive::logkit_error;

#[logkit_error]
pub enum SinkError {
    Io(std::io::Error),
}

fn main() {}
