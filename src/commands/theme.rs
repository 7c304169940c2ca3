use crate::commands::{preference_store, Out};
use crate::prefs::{self, Theme};
use crate::{Config, Result};

/// Shows the theme or, with `toggle`, flips it and persists the new value. When no theme is stored
/// the terminal's background decides.
pub async fn theme(config: Config, toggle: bool) -> Result<Out<Theme>> {
    let store = preference_store(&config);
    let os_prefers_dark = prefs::os_prefers_dark();
    let theme = if toggle {
        Theme::toggle(&store, os_prefers_dark)
    } else {
        Theme::load(&store, os_prefers_dark)
    };
    let verb = if toggle { "is now" } else { "is" };
    Ok(Out::new(format!("The theme {verb} {theme}"), theme))
}
