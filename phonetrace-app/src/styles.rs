use crossterm::style::{Attribute, Color, ContentStyle};

fn fg(color: Color) -> ContentStyle {
    ContentStyle {
        foreground_color: Some(color),
        ..ContentStyle::default()
    }
}

fn bold(color: Color) -> ContentStyle {
    ContentStyle {
        attributes: Attribute::Bold.into(),
        ..fg(color)
    }
}

pub fn title() -> ContentStyle {
    bold(Color::Cyan)
}

pub fn section() -> ContentStyle {
    bold(Color::Yellow)
}

pub fn label() -> ContentStyle {
    fg(Color::DarkGrey)
}

pub fn value() -> ContentStyle {
    fg(Color::White)
}

pub fn link() -> ContentStyle {
    ContentStyle {
        attributes: Attribute::Underlined.into(),
        ..fg(Color::Blue)
    }
}

pub fn available() -> ContentStyle {
    bold(Color::Green)
}

pub fn unavailable() -> ContentStyle {
    fg(Color::DarkGrey)
}

pub fn confidence_high() -> ContentStyle {
    bold(Color::Green)
}

pub fn confidence_medium() -> ContentStyle {
    bold(Color::Yellow)
}

pub fn confidence_low() -> ContentStyle {
    bold(Color::Red)
}

pub fn ticker() -> ContentStyle {
    fg(Color::Cyan)
}

pub fn error() -> ContentStyle {
    bold(Color::Red)
}
