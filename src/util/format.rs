// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

/// Formats a duration in milliseconds as `MM:SS`, or `H:MM:SS` once it
/// reaches an hour. Feed mixes regularly run past the hour mark.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_time(65_000), "01:05");
/// assert_eq!(format_time(3_725_000), "1:02:05");
/// ```
pub(crate) fn format_time(millis: u64) -> String {
    let total_seconds = millis / 1000;
    let hours = total_seconds / 3600;
    let mins = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_an_hour() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65_999), "01:05");
        assert_eq!(format_time(3_599_000), "59:59");
    }

    #[test]
    fn an_hour_or_more() {
        assert_eq!(format_time(3_600_000), "1:00:00");
        assert_eq!(format_time(3_725_000), "1:02:05");
    }
}
