//! LIST command handler.
//!
//! Responds with one `* LIST` line per folder, carrying that
//! folder's attributes and delimiter, followed by any configured
//! extra payloads and the tagged OK:
//!
//! ```text
//! * LIST (\HasNoChildren) "/" "INBOX"
//! * LIST (\Noselect \HasChildren) "/" "[Gmail]"
//! A0002 OK LIST completed
//! ```

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the LIST command.
pub async fn handle_list<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) {
    for folder in &mailbox.folders {
        let line = format!(
            "* LIST ({}) \"{}\" \"{}\"\r\n",
            folder.attributes.join(" "),
            folder.delimiter,
            folder.name
        );
        if write_line(stream, &line).await.is_err() {
            return;
        }
    }
    for payload in &mailbox.extra_list_lines {
        let line = format!("* LIST {payload}\r\n");
        if write_line(stream, &line).await.is_err() {
            return;
        }
    }
    let resp = format!("{tag} OK LIST completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(tag: &str, mailbox: &Mailbox) -> String {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        handle_list(tag, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn lists_all_folders_with_attributes() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .folder_with_attributes("[Gmail]", &["\\Noselect", "\\HasChildren"])
            .build();

        let output = run("A1", &mailbox).await;

        assert!(output.contains("* LIST (\\HasNoChildren) \"/\" \"INBOX\""));
        assert!(output.contains("* LIST (\\Noselect \\HasChildren) \"/\" \"[Gmail]\""));
        assert!(output.ends_with("A1 OK LIST completed\r\n"));
    }

    #[tokio::test]
    async fn emits_extra_payloads_verbatim() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .extra_list_line("(\\HasNoChildren) \"/\" \"\"")
            .build();

        let output = run("T1", &mailbox).await;

        assert!(output.contains("* LIST (\\HasNoChildren) \"/\" \"\"\r\n"));
    }

    #[tokio::test]
    async fn empty_mailbox_returns_only_ok() {
        let mailbox = MailboxBuilder::new().build();
        let output = run("T2", &mailbox).await;

        assert_eq!(output, "T2 OK LIST completed\r\n");
    }
}
