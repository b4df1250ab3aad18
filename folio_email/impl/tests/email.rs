use std::{net::SocketAddr, sync::Arc};

use folio_email_contracts::{ContentType, Email, EmailSendError, EmailService};
use folio_email_impl::{EmailServiceImpl, SmtpSettings, SmtpTls};
use folio_utils::assert_matches;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::Mutex,
};

#[tokio::test]
async fn send_email() {
    let server = FakeSmtpServer::start(Behaviour::Accept).await;
    let sut = server.client();

    let result = sut
        .send(Email {
            recipient: "owner@example.com".parse().unwrap(),
            subject: "The Subject".into(),
            body: "<h1>Hello World!</h1>".into(),
            content_type: ContentType::Html,
            reply_to: Some("\"Jane\" <jane@example.com>".parse().unwrap()),
        })
        .await
        .unwrap();

    let mails = server.mails.lock().await;
    assert_eq!(mails.len(), 1);
    let mail = &mails[0];
    assert_eq!(mail.from, "portfolio@example.com");
    assert_eq!(mail.to, "owner@example.com");
    assert!(mail.data.contains("Subject: The Subject"));
    assert!(mail
        .data
        .lines()
        .any(|line| line.starts_with("Reply-To:") && line.ends_with("<jane@example.com>")));
    assert!(mail.data.contains("Content-Type: text/html"));
    assert!(mail.data.contains("<h1>Hello World!</h1>"));
    assert!(mail
        .data
        .contains(&format!("Message-ID: {}", result.as_str())));
}

#[tokio::test]
async fn rejected_recipient() {
    let server = FakeSmtpServer::start(Behaviour::RejectRecipient).await;
    let sut = server.client();

    let result = sut
        .send(Email {
            recipient: "owner@example.com".parse().unwrap(),
            subject: "The Subject".into(),
            body: "Hello".into(),
            content_type: ContentType::Text,
            reply_to: None,
        })
        .await;

    assert_matches!(result, Err(EmailSendError::Rejected(details)) if details.contains("mailbox unavailable"));
    assert!(server.mails.lock().await.is_empty());
}

#[tokio::test]
async fn ping() {
    let server = FakeSmtpServer::start(Behaviour::Accept).await;
    server.client().ping().await.unwrap();
}

#[tokio::test]
async fn ping_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sut = client(addr);

    assert!(sut.ping().await.is_err());
}

fn client(addr: SocketAddr) -> EmailServiceImpl {
    EmailServiceImpl::new(
        &SmtpSettings {
            host: addr.ip().to_string(),
            port: addr.port(),
            tls: SmtpTls::None,
            credentials: None,
        },
        "Portfolio Website <portfolio@example.com>".parse().unwrap(),
    )
    .unwrap()
}

#[derive(Debug, Clone, Copy)]
enum Behaviour {
    Accept,
    RejectRecipient,
}

#[derive(Debug, Default)]
struct ReceivedMail {
    from: String,
    to: String,
    data: String,
}

/// Just enough of an smtp server to let lettre deliver plain text mails.
struct FakeSmtpServer {
    addr: SocketAddr,
    mails: Arc<Mutex<Vec<ReceivedMail>>>,
}

impl FakeSmtpServer {
    async fn start(behaviour: Behaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mails = Arc::new(Mutex::new(Vec::new()));

        let server_mails = Arc::clone(&mails);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(handle(stream, behaviour, Arc::clone(&server_mails)));
            }
        });

        Self { addr, mails }
    }

    fn client(&self) -> EmailServiceImpl {
        client(self.addr)
    }
}

async fn handle(stream: TcpStream, behaviour: Behaviour, mails: Arc<Mutex<Vec<ReceivedMail>>>) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    let mut current = ReceivedMail::default();

    write.write_all(b"220 localhost ESMTP\r\n").await.unwrap();

    while let Ok(Some(line)) = lines.next_line().await {
        let upper = line.to_ascii_uppercase();
        let reply: &[u8] = if upper.starts_with("EHLO") || upper.starts_with("HELO") {
            b"250 localhost\r\n"
        } else if upper.starts_with("MAIL FROM:") {
            current.from = address(&line);
            b"250 2.1.0 Ok\r\n"
        } else if upper.starts_with("RCPT TO:") {
            current.to = address(&line);
            match behaviour {
                Behaviour::Accept => b"250 2.1.5 Ok\r\n",
                Behaviour::RejectRecipient => b"550 5.1.1 mailbox unavailable\r\n",
            }
        } else if upper == "DATA" {
            write.write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n").await.unwrap();
            while let Ok(Some(data_line)) = lines.next_line().await {
                if data_line == "." {
                    break;
                }
                current.data.push_str(&data_line);
                current.data.push('\n');
            }
            mails.lock().await.push(std::mem::take(&mut current));
            b"250 2.0.0 Ok: queued\r\n"
        } else if upper == "QUIT" {
            let _ = write.write_all(b"221 2.0.0 Bye\r\n").await;
            return;
        } else {
            b"250 2.0.0 Ok\r\n"
        };
        if write.write_all(reply).await.is_err() {
            return;
        }
    }
}

fn address(line: &str) -> String {
    line.split_once('<')
        .and_then(|(_, rest)| rest.split_once('>'))
        .map(|(address, _)| address.to_owned())
        .unwrap_or_default()
}
