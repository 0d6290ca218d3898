/// Opening product links in the system browser
use reqwest::Url;
use std::io;
use std::process::Command;

/// True for absolute http(s) URLs, the only kind we hand to the OS
pub fn is_web_link(link: &str) -> bool {
    Url::parse(link)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Open `link` with the platform's default handler.
pub fn open_in_browser(link: &str) -> io::Result<()> {
    if !is_web_link(link) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to open non-web link {}", link),
        ));
    }

    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    };
    #[cfg(target_os = "macos")]
    let mut command = Command::new("open");
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let mut command = Command::new("xdg-open");

    command.arg(link).spawn()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_web_link() {
        assert!(is_web_link("http://x/a"));
        assert!(is_web_link("https://shop.example.com/cream?id=3"));
        assert!(!is_web_link("file:///etc/passwd"));
        assert!(!is_web_link("javascript:alert(1)"));
        assert!(!is_web_link("a.png"));
    }

    #[test]
    fn test_open_rejects_non_web_link() {
        let err = open_in_browser("file:///etc/passwd").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
