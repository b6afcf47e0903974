/// Returns `input` with every line feed not already preceded by a carriage return replaced
/// by CRLF, as ABNF requires. Carriage returns on their own are left alone.
pub fn normalize_line_endings(input: &str) -> String {
    let mut res = String::with_capacity(input.len() + input.len() / 16);
    let mut last_char: char = ' ';
    for c in input.chars() {
        if c == '\n' && last_char != '\r' {
            res.push('\r');
        }
        res.push(c);
        last_char = c;
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_bare_line_feeds() {
        //setup
        let input = "a = b\nb = \"c\"\n";

        //exercise
        let res = normalize_line_endings(input);

        //verify
        assert_eq!(res, "a = b\r\nb = \"c\"\r\n");
    }

    #[test]
    fn normalize_keeps_crlf() {
        //setup
        let input = "a = b\r\n\nc\r\r\n";

        //exercise
        let res = normalize_line_endings(input);

        //verify
        assert_eq!(res, "a = b\r\n\r\nc\r\r\n");
    }

    #[test]
    fn normalize_leading_line_feed() {
        assert_eq!(normalize_line_endings("\n"), "\r\n");
        assert_eq!(normalize_line_endings(""), "");
        assert_eq!(normalize_line_endings("no newline"), "no newline");
    }
}
