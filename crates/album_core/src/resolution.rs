/// Size keys of a photo record, declared from largest to smallest.
///
/// A record exposes each available size as a `<key>_src` field; the first key in
/// `BY_PRIORITY` that is present and non-empty decides the record's `ResourceUrl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeKey {
    W,
    Z,
    Y,
    X,
    R,
    Q,
    P,
    O,
    M,
    S,
}

impl SizeKey {
    pub const BY_PRIORITY: [SizeKey; 10] = [
        SizeKey::W,
        SizeKey::Z,
        SizeKey::Y,
        SizeKey::X,
        SizeKey::R,
        SizeKey::Q,
        SizeKey::P,
        SizeKey::O,
        SizeKey::M,
        SizeKey::S,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            SizeKey::W => "w_src",
            SizeKey::Z => "z_src",
            SizeKey::Y => "y_src",
            SizeKey::X => "x_src",
            SizeKey::R => "r_src",
            SizeKey::Q => "q_src",
            SizeKey::P => "p_src",
            SizeKey::O => "o_src",
            SizeKey::M => "m_src",
            SizeKey::S => "s_src",
        }
    }
}

/// Pick the highest-resolution URL of one record. `lookup` maps a field name to its value.
pub fn select_highest_resolution<'a, F>(lookup: F) -> Option<(SizeKey, &'a str)>
where
    F: Fn(&str) -> Option<&'a str>,
{
    SizeKey::BY_PRIORITY.iter().find_map(|key| {
        lookup(key.field_name())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| (*key, value))
    })
}
