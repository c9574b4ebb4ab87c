//! Startup banner and session summary display.

use crate::consts::{AUTHOR, HOMEPAGE, REPO};

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub origin: &'a str,
    pub cache_name: &'a str,
    pub database: &'a str,
    pub worker: bool,
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    let worker = if info.worker { "enabled" } else { "disabled" };
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║      R E S T A U R A N T   R E V      ║
   ║    a directory that works offline     ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   origin    {}
   cache     {}
   database  {}
   worker    {}

   type help for commands
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.origin,
        info.cache_name,
        info.database,
        worker,
    );
}

/// Print the session summary (pages visited + farewell).
pub fn print_session_summary(pages_visited: usize) {
    if pages_visited > 0 {
        let noun = if pages_visited == 1 { "page" } else { "pages" };
        println!("session: {pages_visited} {noun} in history");
    }
    println!("goodbye.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_banner_does_not_panic() {
        let info = BannerInfo {
            origin: "http://localhost:8000",
            cache_name: "restaurant-reviews",
            database: "ephemeral",
            worker: true,
        };
        print_banner(&info);
    }

    #[test]
    fn print_session_summary_with_pages() {
        print_session_summary(3);
    }

    #[test]
    fn print_session_summary_empty() {
        print_session_summary(0);
    }
}
