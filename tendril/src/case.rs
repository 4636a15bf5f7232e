//! Field name → host-visible signal name.

/// Converts a `PascalCase` (or `camelCase`) field name into the `snake_case` name a host sees.
///
/// # Logic
///
/// - Every character is lowercased.
/// - An underscore is inserted before an uppercase letter that follows a lowercase letter or a
///   digit: `HealthChanged` → `health_changed`, `Level2Up` → `level2_up`.
/// - In a run of uppercase letters, the run is treated as one word, except that the last letter
///   starts a new word if a lowercase letter follows it: `HTTPRequest` → `http_request`,
///   `IOError` → `io_error`, `ResetHTTP` → `reset_http`.
/// - Digits stay attached to the preceding word: `Area2D` → `area2_d`.
/// - A leading uppercase letter never produces a leading underscore, and existing underscores are
///   kept without being doubled: `Already_Split` → `already_split`.
///
/// The function is idempotent on names that are already `snake_case`.
#[must_use]
pub fn to_snake_case(name: &str) -> String {
	let mut snake = String::with_capacity(name.len() + name.len() / 4);
	let mut previous: Option<char> = None;
	let mut chars = name.chars().peekable();

	while let Some(c) = chars.next() {
		if c.is_uppercase() {
			let next_is_lowercase = chars.peek().is_some_and(|next| next.is_lowercase());
			let starts_word = match previous {
				None | Some('_') => false,
				Some(previous) if previous.is_lowercase() || previous.is_numeric() => true,
				Some(previous) => previous.is_uppercase() && next_is_lowercase,
			};
			if starts_word {
				snake.push('_');
			}
			snake.extend(c.to_lowercase());
		} else {
			snake.push(c);
		}
		previous = Some(c);
	}

	snake
}

#[cfg(test)]
mod tests {
	use super::to_snake_case;

	#[test]
	fn pascal_case() {
		assert_eq!(to_snake_case("Pressed"), "pressed");
		assert_eq!(to_snake_case("HealthChanged"), "health_changed");
		assert_eq!(to_snake_case("AnimationFinishedPlaying"), "animation_finished_playing");
	}

	#[test]
	fn camel_case() {
		assert_eq!(to_snake_case("bodyEntered"), "body_entered");
	}

	#[test]
	fn capital_runs() {
		assert_eq!(to_snake_case("HTTPRequest"), "http_request");
		assert_eq!(to_snake_case("IOError"), "io_error");
		assert_eq!(to_snake_case("ResetHTTP"), "reset_http");
		assert_eq!(to_snake_case("ABC"), "abc");
		assert_eq!(to_snake_case("X"), "x");
	}

	#[test]
	fn digits() {
		assert_eq!(to_snake_case("Level2Up"), "level2_up");
		assert_eq!(to_snake_case("Area2D"), "area2_d");
		assert_eq!(to_snake_case("Player1"), "player1");
	}

	#[test]
	fn underscores() {
		assert_eq!(to_snake_case("Already_Split"), "already_split");
		assert_eq!(to_snake_case("_Private"), "_private");
	}

	#[test]
	fn idempotent_on_snake_case() {
		for name in ["pressed", "health_changed", "http_request", "area2_d", ""] {
			assert_eq!(to_snake_case(name), name);
			assert_eq!(to_snake_case(&to_snake_case(name)), to_snake_case(name));
		}
	}

	#[test]
	fn non_ascii() {
		assert_eq!(to_snake_case("ÜberSignal"), "über_signal");
	}
}
