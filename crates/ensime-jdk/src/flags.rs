/// Thread stack size the ENSIME server needs; `-Xss1m` overflows on deep trees.
pub const DEFAULT_STACK_SIZE_FLAG: &str = "-Xss2m";

/// Normalizes the active JVM flags for the server: `-Xss1m` is raised to
/// [`DEFAULT_STACK_SIZE_FLAG`], and the default is appended when no `-Xss` is set.
pub fn java_flags<I, S>(active: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut flags: Vec<String> = active
        .into_iter()
        .map(Into::into)
        .map(|flag| {
            if flag == "-Xss1m" {
                DEFAULT_STACK_SIZE_FLAG.to_string()
            } else {
                flag
            }
        })
        .collect();

    if !flags.iter().any(|flag| flag.starts_with("-Xss")) {
        flags.push(DEFAULT_STACK_SIZE_FLAG.to_string());
    }
    flags
}

/// Splits a whitespace separated flag list such as `ENSIME_JAVA_FLAGS`.
pub fn split_flags(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}
