//! Utility token rules.
//!
//! Maps one class token to its CSS declarations. Unknown tokens map to
//! `None` and are skipped by the generator. Palette colors are computed, not
//! tabulated: each color name carries a hue, and the shade selects lightness.

/// Declarations for one token, or `None` when the token is not a utility.
pub(crate) fn declarations(token: &str) -> Option<String> {
    if let Some(decl) = exact(token) {
        return Some(decl.to_string());
    }
    spacing(token)
        .or_else(|| sizing(token))
        .or_else(|| typography(token))
        .or_else(|| palette(token))
}

fn exact(token: &str) -> Option<&'static str> {
    let decl = match token {
        "flex" => "display: flex",
        "grid" => "display: grid",
        "block" => "display: block",
        "hidden" => "display: none",
        "flex-row" => "flex-direction: row",
        "flex-col" => "flex-direction: column",
        "flex-wrap" => "flex-wrap: wrap",
        "flex-1" => "flex: 1 1 0%",
        "items-start" => "align-items: flex-start",
        "items-center" => "align-items: center",
        "items-end" => "align-items: flex-end",
        "items-stretch" => "align-items: stretch",
        "justify-start" => "justify-content: flex-start",
        "justify-center" => "justify-content: center",
        "justify-end" => "justify-content: flex-end",
        "justify-between" => "justify-content: space-between",
        "justify-around" => "justify-content: space-around",
        "text-left" => "text-align: left",
        "text-center" => "text-align: center",
        "text-right" => "text-align: right",
        "font-light" => "font-weight: 300",
        "font-normal" => "font-weight: 400",
        "font-medium" => "font-weight: 500",
        "font-semibold" => "font-weight: 600",
        "font-bold" => "font-weight: 700",
        "italic" => "font-style: italic",
        "underline" => "text-decoration: underline",
        "rounded" => "border-radius: 0.25rem",
        "rounded-sm" => "border-radius: 0.125rem",
        "rounded-md" => "border-radius: 0.375rem",
        "rounded-lg" => "border-radius: 0.5rem",
        "rounded-xl" => "border-radius: 0.75rem",
        "rounded-full" => "border-radius: 9999px",
        "shadow-sm" => "box-shadow: 0 1px 2px rgb(0 0 0 / 0.05)",
        "shadow" => "box-shadow: 0 1px 3px rgb(0 0 0 / 0.1)",
        "shadow-md" => "box-shadow: 0 4px 6px rgb(0 0 0 / 0.1)",
        "shadow-lg" => "box-shadow: 0 10px 15px rgb(0 0 0 / 0.1)",
        "w-full" => "width: 100%",
        "h-full" => "height: 100%",
        "w-screen" => "width: 100vw",
        "h-screen" => "height: 100vh",
        "text-white" => "color: #ffffff",
        "text-black" => "color: #000000",
        "bg-white" => "background-color: #ffffff",
        "bg-black" => "background-color: #000000",
        "bg-transparent" => "background-color: transparent",
        _ => return None,
    };
    Some(decl)
}

/// Spacing scale: one unit is 0.25rem.
fn spacing(token: &str) -> Option<String> {
    let (prefix, value) = token.rsplit_once('-')?;
    let n: f32 = value.parse().ok()?;
    if !(0.0..=96.0).contains(&n) {
        return None;
    }
    let rem = n * 0.25;
    let decl = match prefix {
        "p" => format!("padding: {rem}rem"),
        "px" => format!("padding-left: {rem}rem; padding-right: {rem}rem"),
        "py" => format!("padding-top: {rem}rem; padding-bottom: {rem}rem"),
        "pt" => format!("padding-top: {rem}rem"),
        "pr" => format!("padding-right: {rem}rem"),
        "pb" => format!("padding-bottom: {rem}rem"),
        "pl" => format!("padding-left: {rem}rem"),
        "m" => format!("margin: {rem}rem"),
        "mx" => format!("margin-left: {rem}rem; margin-right: {rem}rem"),
        "my" => format!("margin-top: {rem}rem; margin-bottom: {rem}rem"),
        "mt" => format!("margin-top: {rem}rem"),
        "mr" => format!("margin-right: {rem}rem"),
        "mb" => format!("margin-bottom: {rem}rem"),
        "ml" => format!("margin-left: {rem}rem"),
        "gap" => format!("gap: {rem}rem"),
        "gap-x" => format!("column-gap: {rem}rem"),
        "gap-y" => format!("row-gap: {rem}rem"),
        _ => return None,
    };
    Some(decl)
}

/// Fractional widths and heights: `w-1/2`, `h-2/3`.
fn sizing(token: &str) -> Option<String> {
    let (property, fraction) = match token.split_once('-')? {
        ("w", rest) => ("width", rest),
        ("h", rest) => ("height", rest),
        _ => return None,
    };
    let (num, den) = fraction.split_once('/')?;
    let num: f32 = num.parse().ok()?;
    let den: f32 = den.parse().ok()?;
    if den == 0.0 || num > den {
        return None;
    }
    let pct = num / den * 100.0;
    Some(format!("{property}: {pct}%"))
}

fn typography(token: &str) -> Option<String> {
    let size = token.strip_prefix("text-")?;
    let (font_size, line_height) = match size {
        "xs" => ("0.75rem", "1rem"),
        "sm" => ("0.875rem", "1.25rem"),
        "base" => ("1rem", "1.5rem"),
        "lg" => ("1.125rem", "1.75rem"),
        "xl" => ("1.25rem", "1.75rem"),
        "2xl" => ("1.5rem", "2rem"),
        "3xl" => ("1.875rem", "2.25rem"),
        "4xl" => ("2.25rem", "2.5rem"),
        "5xl" => ("3rem", "1"),
        "6xl" => ("3.75rem", "1"),
        "7xl" => ("4.5rem", "1"),
        "8xl" => ("6rem", "1"),
        "9xl" => ("8rem", "1"),
        _ => return None,
    };
    Some(format!("font-size: {font_size}; line-height: {line_height}"))
}

/// Computed palette: `text-{color}-{shade}` and `bg-{color}-{shade}`.
fn palette(token: &str) -> Option<String> {
    let (property, rest) = if let Some(rest) = token.strip_prefix("text-") {
        ("color", rest)
    } else if let Some(rest) = token.strip_prefix("bg-") {
        ("background-color", rest)
    } else {
        return None;
    };

    let (name, shade) = rest.rsplit_once('-')?;
    let shade: u32 = shade.parse().ok()?;
    if !matches!(shade, 50 | 100 | 200 | 300 | 400 | 500 | 600 | 700 | 800 | 900) {
        return None;
    }

    let (hue, saturation) = hue_of(name)?;
    let lightness = 97.0 - shade as f32 * 0.085;
    Some(format!(
        "{property}: hsl({hue} {saturation}% {lightness:.1}%)"
    ))
}

fn hue_of(name: &str) -> Option<(u32, u32)> {
    let pair = match name {
        "slate" => (215, 16),
        "gray" => (220, 9),
        "red" => (0, 72),
        "orange" => (25, 90),
        "amber" => (38, 92),
        "yellow" => (48, 95),
        "lime" => (85, 78),
        "green" => (140, 70),
        "emerald" => (152, 72),
        "teal" => (173, 75),
        "cyan" => (190, 85),
        "sky" => (200, 90),
        "blue" => (217, 85),
        "indigo" => (239, 80),
        "violet" => (258, 85),
        "purple" => (270, 82),
        "fuchsia" => (292, 84),
        "pink" => (330, 80),
        "rose" => (350, 85),
        _ => return None,
    };
    Some(pair)
}
