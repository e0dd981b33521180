//! Embedded scripted SMTP server, so client sessions run against a
//! real socket without mocks.
//!
//! The server handles a single connection, answers each command from
//! a fixed script and reports everything it saw through a channel.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;

/// What the server saw and produced during the session.
#[derive(Debug)]
pub enum Event {
    /// A command line received from the client.
    Command(String),
    /// A completed mail transaction.
    Mail(ReceivedMail),
}

/// One mail transaction as the server accepted it.
#[derive(Debug)]
pub struct ReceivedMail {
    pub from: String,
    pub to: Vec<String>,
    pub data: String,
}

/// Scripted behavior for one session.
pub struct ServerOptions {
    /// Final reply to a completed AUTH exchange.
    pub auth_verdict: &'static str,
    /// AUTH mechanisms advertised in the EHLO reply.
    pub auth_line: &'static str,
    /// Recipients refused with 550 at RCPT time.
    pub reject: Vec<String>,
    /// Whether EHLO advertises STARTTLS.
    pub offer_starttls: bool,
    /// When false, EHLO is answered 502 and a HELO fallback is
    /// expected.
    pub accept_ehlo: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            auth_verdict: "235 Authentication succeeded",
            auth_line: "250-AUTH PLAIN LOGIN",
            reject: Vec::new(),
            offer_starttls: false,
            accept_ehlo: true,
        }
    }
}

/// Start a one-session server on an ephemeral port. Returns the port
/// and the event stream; events stop when the session ends.
pub fn start_server(opts: ServerOptions) -> (u16, mpsc::Receiver<Event>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            handle_session(stream, &opts, &tx);
        }
    });

    (port, rx)
}

fn handle_session(mut stream: TcpStream, opts: &ServerOptions, events: &mpsc::Sender<Event>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    write_line(&mut stream, "220 test.local Service ready");

    let mut from = String::new();
    let mut to: Vec<String> = Vec::new();

    loop {
        let Some(command) = read_command(&mut reader, events) else {
            break;
        };
        let upper = command.to_uppercase();

        if upper.starts_with("EHLO") {
            if opts.accept_ehlo {
                write_line(&mut stream, "250-test.local Hello");
                if opts.offer_starttls {
                    write_line(&mut stream, "250-STARTTLS");
                }
                write_line(&mut stream, opts.auth_line);
                write_line(&mut stream, "250 SIZE 10240000");
            } else {
                write_line(&mut stream, "502 Command not implemented");
            }
        } else if upper.starts_with("HELO") {
            write_line(&mut stream, "250 test.local");
        } else if upper.starts_with("STARTTLS") {
            // No TLS stack on this side; refusing still lets ordering
            // tests observe the command.
            write_line(&mut stream, "454 TLS not available");
        } else if upper.starts_with("AUTH PLAIN") {
            write_line(&mut stream, opts.auth_verdict);
        } else if upper.starts_with("AUTH LOGIN") {
            write_line(&mut stream, "334 VXNlcm5hbWU6");
            if read_command(&mut reader, events).is_none() {
                break;
            }
            write_line(&mut stream, "334 UGFzc3dvcmQ6");
            if read_command(&mut reader, events).is_none() {
                break;
            }
            write_line(&mut stream, opts.auth_verdict);
        } else if upper.starts_with("MAIL FROM:") {
            from = strip_angles(&command["MAIL FROM:".len()..]);
            to.clear();
            write_line(&mut stream, "250 OK");
        } else if upper.starts_with("RCPT TO:") {
            let addr = strip_angles(&command["RCPT TO:".len()..]);
            if opts.reject.contains(&addr) {
                write_line(&mut stream, "550 5.1.1 User unknown");
            } else {
                to.push(addr);
                write_line(&mut stream, "250 OK");
            }
        } else if upper == "DATA" {
            write_line(&mut stream, "354 End data with <CR><LF>.<CR><LF>");
            let mut data_lines = Vec::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    return;
                }
                let line = line.trim_end().to_string();
                if line == "." {
                    break;
                }
                data_lines.push(line);
            }
            write_line(&mut stream, "250 OK");
            let _ = events.send(Event::Mail(ReceivedMail {
                from: from.clone(),
                to: to.clone(),
                data: data_lines.join("\n"),
            }));
        } else if upper == "QUIT" {
            write_line(&mut stream, "221 Bye");
            break;
        } else {
            write_line(&mut stream, "500 Syntax error, command unrecognized");
        }
    }
}

/// Read one command line, recording it as an event. `None` on EOF.
fn read_command(
    reader: &mut BufReader<TcpStream>,
    events: &mpsc::Sender<Event>,
) -> Option<String> {
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            return None;
        }
        let command = line.trim().to_string();
        if command.is_empty() {
            continue;
        }
        let _ = events.send(Event::Command(command.clone()));
        return Some(command);
    }
}

fn write_line(stream: &mut TcpStream, line: &str) {
    let _ = stream.write_all(format!("{line}\r\n").as_bytes());
    let _ = stream.flush();
}

fn strip_angles(rest: &str) -> String {
    rest.trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .to_string()
}
