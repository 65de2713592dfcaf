use logkit_derive::logkit_error;

#[logkit_error]
pub struct SinkError {
    message: String,
}

fn main() {}
