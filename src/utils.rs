/// Maps a 1-based line and column (counted in characters) to a byte offset.
/// Positions past the end of a line clamp to the line end, positions past the last line clamp
/// to the end of the source.
pub fn get_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let content = text.trim_end_matches(['\n', '\r']);
            let within = content
                .char_indices()
                .nth(column.saturating_sub(1))
                .map_or(content.len(), |(i, _)| i);
            return offset + within;
        }
        offset += text.len();
    }
    source.len()
}
