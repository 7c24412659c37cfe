use derive_more::IsVariant;

#[derive(Debug, Clone, Copy, IsVariant)]
enum Seq {
    Slash,
    SlashDot,
    SlashDotDot,
    Other,
}

/// Drops the last component of an absolute path held in `valid`, keeping its leading '/'. The root
/// has no parent, so "/.." stays "/".
fn pop_component(valid: &mut Vec<u8>) {
    if valid.len() > 1 && valid.last() == Some(&b'/') {
        valid.pop();
    }
    let keep = valid.iter().rposition(|ch| *ch == b'/').map_or(1, |i| i + 1);
    valid.truncate(keep);
}

/// Normalizes an absolute path in a single pass, copying bytes across rather than inserting and
/// removing in place. Removes repeated '/', "." components and trailing '/', and applies ".."
/// lexically. The input must already be free of NUL bytes.
pub(crate) fn sanitize(value: &[u8]) -> Vec<u8> {
    let mut last_seq = Seq::Other;
    let mut valid = Vec::with_capacity(value.len() + 1);

    for ch in b"/".iter().chain(value.iter()).cloned() {
        match (ch, last_seq) {
            (b'/', Seq::Slash) => (),
            (b'/', Seq::SlashDot) => {
                last_seq = Seq::Slash;
            },
            (b'/', Seq::SlashDotDot) => {
                pop_component(&mut valid);
                last_seq = Seq::Slash;
            },
            (b'/', Seq::Other) => {
                last_seq = Seq::Slash;
                valid.push(ch);
            },
            (b'.', Seq::Slash) => {
                last_seq = Seq::SlashDot;
            },
            (b'.', Seq::SlashDot) => {
                last_seq = Seq::SlashDotDot;
            },
            (_, Seq::Slash) => {
                last_seq = Seq::Other;
                valid.push(ch);
            },
            (_, Seq::SlashDot) => {
                last_seq = Seq::Other;
                valid.push(b'.');
                valid.push(ch);
            },
            (_, Seq::SlashDotDot) => {
                last_seq = Seq::Other;
                valid.extend_from_slice(b"..");
                valid.push(ch);
            },
            (_, Seq::Other) => {
                valid.push(ch);
            },
        }
    }

    if last_seq.is_slash_dot_dot() {
        pop_component(&mut valid);
    }
    if valid.len() > 1 && valid.last() == Some(&b'/') {
        valid.pop();
    }

    valid
}

/// Splits a file name into its base and extension, where the extension keeps its leading '.'. A
/// leading '.' alone (as in ".bashrc") doesn't start an extension.
pub(crate) fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, ""),
        Some(i) => file_name.split_at(i),
    }
}
