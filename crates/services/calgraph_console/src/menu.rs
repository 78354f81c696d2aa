// --- File: crates/services/calgraph_console/src/menu.rs ---

/// Entries of the main menu, numbered as printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Exit,
    DisplayAccessToken,
    CheckAvailability,
    CreateAndUpdateEvent,
    PreviewWeek,
    SuggestFreeTimes,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 6] = [
        MenuChoice::Exit,
        MenuChoice::DisplayAccessToken,
        MenuChoice::CheckAvailability,
        MenuChoice::CreateAndUpdateEvent,
        MenuChoice::PreviewWeek,
        MenuChoice::SuggestFreeTimes,
    ];

    pub fn number(self) -> u32 {
        match self {
            MenuChoice::Exit => 0,
            MenuChoice::DisplayAccessToken => 1,
            MenuChoice::CheckAvailability => 2,
            MenuChoice::CreateAndUpdateEvent => 3,
            MenuChoice::PreviewWeek => 4,
            MenuChoice::SuggestFreeTimes => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuChoice::Exit => "Exit",
            MenuChoice::DisplayAccessToken => "Display access token",
            MenuChoice::CheckAvailability => "Check availability",
            MenuChoice::CreateAndUpdateEvent => "Create and update event",
            MenuChoice::PreviewWeek => "Preview week",
            MenuChoice::SuggestFreeTimes => "Suggest free times",
        }
    }

    /// Parses a typed menu entry. Anything but a listed number is `None`.
    pub fn parse(input: &str) -> Option<MenuChoice> {
        let number: u32 = input.trim().parse().ok()?;
        MenuChoice::ALL.into_iter().find(|c| c.number() == number)
    }
}

pub fn render_menu() -> String {
    let mut text = String::from("Please choose one of the following options:\n");
    for choice in MenuChoice::ALL {
        text.push_str(&format!("{}. {}\n", choice.number(), choice.label()));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu_choice() {
        assert_eq!(MenuChoice::parse("0"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse(" 3 \n"), Some(MenuChoice::CreateAndUpdateEvent));
        assert_eq!(MenuChoice::parse("5"), Some(MenuChoice::SuggestFreeTimes));
        assert_eq!(MenuChoice::parse("6"), None);
        assert_eq!(MenuChoice::parse("-1"), None);
        assert_eq!(MenuChoice::parse("two"), None);
        assert_eq!(MenuChoice::parse(""), None);
    }

    #[test]
    fn test_render_menu_lists_every_option_in_order() {
        let menu = render_menu();
        let lines: Vec<&str> = menu.lines().collect();
        assert_eq!(lines[0], "Please choose one of the following options:");
        assert_eq!(lines[1], "0. Exit");
        assert_eq!(lines[2], "1. Display access token");
        assert_eq!(lines[6], "5. Suggest free times");
        assert_eq!(lines.len(), 7);
    }
}
