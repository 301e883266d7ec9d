use pathscout::wordlist::{load_wordlist_from_path, parse_wordlist_str};

#[test]
fn parse_paths_comments_and_duplicates() {
    let input = r#"
        # panels
        admin
        /admin
        .git/HEAD
        # blank line follows

        backup.zip
    "#;

    let words = parse_wordlist_str(input);
    // Dedup, preserve first appearance
    assert_eq!(words, vec!["admin", ".git/HEAD", "backup.zip"]);
}

#[test]
fn load_from_file() {
    let path = std::env::temp_dir().join(format!("pathscout-words-{}.txt", std::process::id()));
    std::fs::write(&path, "admin\n.env\n").unwrap();
    let words = load_wordlist_from_path(&path).expect("load ok");
    std::fs::remove_file(&path).ok();
    assert_eq!(words, vec!["admin".to_string(), ".env".to_string()]);
}

#[test]
fn missing_file_is_error() {
    assert!(load_wordlist_from_path("/nonexistent/pathscout/words.txt").is_err());
}
