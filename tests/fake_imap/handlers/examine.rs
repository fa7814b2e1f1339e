//! EXAMINE command handler.
//!
//! Opens a folder read-only and responds with the minimum metadata a
//! client needs (RFC 3501 Section 6.3.2 mirrors SELECT). The
//! repository layer uses EXAMINE to validate explicitly included
//! folders, so the interesting cases are "exists" and "does not
//! exist".

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the EXAMINE command. Returns whether the folder exists.
pub async fn handle_examine<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    folder_name: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> bool {
    if mailbox.get_folder(folder_name).is_some() {
        let _ = write_line(
            stream,
            "* FLAGS (\\Seen \\Answered \\Flagged \\Deleted \\Draft)\r\n",
        )
        .await;
        let _ = write_line(stream, "* 0 EXISTS\r\n").await;
        let _ = write_line(stream, "* 0 RECENT\r\n").await;
        let _ = write_line(stream, "* OK [UIDVALIDITY 1]\r\n").await;
        let _ = write_line(stream, "* OK [UIDNEXT 1]\r\n").await;
        let _ = write_line(stream, "* OK [PERMANENTFLAGS ()] Read-only\r\n").await;

        let resp = format!("{tag} OK [READ-ONLY] EXAMINE completed\r\n");
        let _ = write_line(stream, &resp).await;
        true
    } else {
        let resp = format!("{tag} NO Folder not found\r\n");
        let _ = write_line(stream, &resp).await;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(tag: &str, folder_name: &str, mailbox: &Mailbox) -> (String, bool) {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        let found = handle_examine(tag, folder_name, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        (String::from_utf8(buf).unwrap(), found)
    }

    #[tokio::test]
    async fn examines_existing_folder_read_only() {
        let mailbox = MailboxBuilder::new().folder("Archive").build();

        let (output, found) = run("A1", "Archive", &mailbox).await;

        assert!(found);
        assert!(output.contains("* 0 EXISTS"));
        assert!(output.contains("UIDVALIDITY"));
        assert!(output.contains("A1 OK [READ-ONLY] EXAMINE completed"));
    }

    #[tokio::test]
    async fn missing_folder_is_no() {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();

        let (output, found) = run("A1", "NoSuchFolder", &mailbox).await;

        assert!(!found);
        assert!(output.contains("A1 NO Folder not found"));
    }
}
