use herald_derive::herald_error;

#[herald_error]
pub struct DemoError {
    message: String,
}

fn main() {}
