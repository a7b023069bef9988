use std::io::{self, BufRead, Write};

/// Reads one answer. `None` means the answer was not recognised.
pub fn prompt_bool<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Option<bool>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before the operator answered",
        ));
    }

    match line.trim().to_lowercase().as_str() {
        "yes" | "y" => Ok(Some(true)),
        "no" | "n" => Ok(Some(false)),
        _ => {
            writeln!(output, "Please respond with 'yes' or 'no'")?;
            Ok(None)
        }
    }
}

/// Asks until a yes or no answer is given.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<bool> {
    loop {
        if let Some(answer) = prompt_bool(input, output)? {
            return Ok(answer);
        }
    }
}
