/// Returns a shorter version of [`std::any::type_name`]
///
/// Every path in the name is cut down to its last segment, generic arguments
/// included.
///
/// ```
/// use maze_search::debug::type_name;
///
/// assert_eq!(type_name::<Vec<String>>(), "Vec<String>");
/// assert_eq!(type_name::<(u8, Option<bool>)>(), "(u8, Option<bool>)");
/// ```
pub fn type_name<T: ?Sized>() -> String {
    shorten_type_name(std::any::type_name::<T>())
}

fn shorten_type_name(name: &str) -> String {
    let mut short_name = String::with_capacity(name.len());
    let mut segment_start = 0;

    for (i, ch) in name.char_indices() {
        if ch == ':' {
            // Drop everything up to and including the `::`
            segment_start = i + ch.len_utf8();
        } else if matches!(ch, '&' | '<' | '>' | '(' | ')' | '[' | ']' | ',' | ';' | ' ') {
            if segment_start < i {
                short_name.push_str(&name[segment_start..i]);
            }
            short_name.push(ch);
            segment_start = i + ch.len_utf8();
        }
    }
    if segment_start < name.len() {
        short_name.push_str(&name[segment_start..]);
    }

    short_name
}
