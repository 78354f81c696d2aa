// --- File: crates/services/calgraph_console/src/prompt.rs ---
//! Interactive prompts. Numbers are re-asked until they parse, and a date
//! that does not exist on the calendar restarts the whole date prompt.

use chrono::{NaiveDate, NaiveDateTime};
use inquire::{CustomType, InquireError, Text};

pub fn prompt_menu_choice() -> Result<String, InquireError> {
    Text::new("Choice:").prompt()
}

pub fn prompt_title() -> Result<String, InquireError> {
    Text::new("Title:").prompt()
}

fn prompt_number<T>(label: &str) -> Result<T, InquireError>
where
    T: Clone + std::str::FromStr + ToString,
{
    CustomType::<T>::new(label)
        .with_error_message("Please type a whole number")
        .prompt()
}

/// Asks for year, month, day, hour and minute one after the other.
pub fn prompt_date_time(heading: &str) -> Result<NaiveDateTime, InquireError> {
    println!("{}", heading);
    loop {
        let year: i32 = prompt_number("Year:")?;
        let month: u32 = prompt_number("Month:")?;
        let day: u32 = prompt_number("Day:")?;
        let hour: u32 = prompt_number("Hour:")?;
        let minute: u32 = prompt_number("Min:")?;
        match build_date_time(year, month, day, hour, minute) {
            Some(value) => return Ok(value),
            None => println!(
                "{:04}-{:02}-{:02} {:02}:{:02} is not a valid date and time, try again.",
                year, month, day, hour, minute
            ),
        }
    }
}

pub(crate) fn build_date_time(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}
