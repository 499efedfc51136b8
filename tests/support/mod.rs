/*!
Test support helpers shared across integration tests.

- argv(items): owned argv from string slices
- StubTransport: in-memory Transport returning queued responses and recording sent argvs
- run_session(..): drive a Session with captured stdout/stderr and scripted stdin
- HttpFixture: one-shot HTTP/1.1 server on 127.0.0.1 replying with canned responses
  (start_delayed holds each reply back to emulate a slow server-side command)
*/

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::rc::Rc;
use std::thread::JoinHandle;
use std::time::Duration;

use ubi_cli::{Config, ProxyError, Response, Session, Streams, Transport};

#[allow(dead_code)]
pub fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[allow(dead_code)]
pub fn config() -> Config {
    Config::new("tok", url::Url::parse("http://127.0.0.1:9/cli").unwrap())
}

#[allow(dead_code)]
pub fn output(body: &str) -> Response {
    Response::from_parts(200, &[], body)
}

#[allow(dead_code)]
pub fn confirm(prompt: &str, body: &str) -> Response {
    Response::from_parts(200, &[("ubi-confirm", prompt)], body)
}

#[allow(dead_code)]
pub fn execute(program: &str, tokens: &[&str]) -> Response {
    Response::from_parts(200, &[("ubi-command-execute", program)], tokens.join("\0"))
}

/// In-memory transport: pops one queued response per send.
pub struct StubTransport {
    responses: VecDeque<Response>,
    sent: Rc<RefCell<Vec<Vec<String>>>>,
}

#[allow(dead_code)]
impl StubTransport {
    pub fn new(responses: Vec<Response>) -> (Self, Rc<RefCell<Vec<Vec<String>>>>) {
        let sent = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                responses: responses.into(),
                sent: Rc::clone(&sent),
            },
            sent,
        )
    }
}

impl Transport for StubTransport {
    fn send(&mut self, argv: &[String]) -> Result<Response, ProxyError> {
        self.sent.borrow_mut().push(argv.to_vec());
        self.responses
            .pop_front()
            .ok_or(ProxyError::SendRequest)
    }
}

#[allow(dead_code)]
pub struct SessionRun {
    pub result: Result<i32, ProxyError>,
    pub stdout: String,
    pub stderr: String,
    pub sent: Vec<Vec<String>>,
}

/// Run a session over `responses`, feeding `stdin` to any confirmation prompt.
#[allow(dead_code)]
pub fn run_session(
    config: Config,
    responses: Vec<Response>,
    initial: &[&str],
    stdin: &str,
) -> SessionRun {
    let (transport, sent) = StubTransport::new(responses);
    let mut session = Session::new(transport, config);

    let mut input = io::Cursor::new(stdin.as_bytes().to_vec());
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = {
        let mut streams = Streams {
            stdin: &mut input,
            stdout: &mut out,
            stderr: &mut err,
        };
        session.run(argv(initial), &mut streams)
    };

    let sent = sent.borrow().clone();
    SessionRun {
        result,
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
        sent,
    }
}

/// Raw request captured by the HTTP fixture.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Format a minimal HTTP/1.1 response with extra headers.
#[allow(dead_code)]
pub fn http_response(status: u16, headers: &[(&str, &str)], body: &str) -> String {
    let mut s = format!("HTTP/1.1 {status} X\r\n");
    for (k, v) in headers {
        s.push_str(&format!("{k}: {v}\r\n"));
    }
    s.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    s
}

/// Serves one canned response per accepted connection, in order.
pub struct HttpFixture {
    pub url: String,
    handle: JoinHandle<Vec<CapturedRequest>>,
}

#[allow(dead_code)]
impl HttpFixture {
    pub fn start(responses: Vec<String>) -> Self {
        Self::start_delayed(responses, Duration::ZERO)
    }

    /// Like `start`, but sleeps `delay` after reading each request before replying.
    pub fn start_delayed(responses: Vec<String>, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fixture");
        let port = listener.local_addr().unwrap().port();
        let handle = std::thread::spawn(move || {
            let mut captured = Vec::new();
            for resp in responses {
                let (mut stream, _) = match listener.accept() {
                    Ok(s) => s,
                    Err(_) => break,
                };
                let _ = stream.set_read_timeout(Some(Duration::from_secs(10)));
                if let Some(req) = read_request(&mut stream) {
                    captured.push(req);
                }
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                let _ = stream.write_all(resp.as_bytes());
                let _ = stream.flush();
            }
            captured
        });
        Self {
            url: format!("http://127.0.0.1:{port}/cli"),
            handle,
        }
    }

    /// Wait for the server thread and return what it received.
    pub fn finish(self) -> Vec<CapturedRequest> {
        self.handle.join().expect("fixture thread")
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn read_request(stream: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    let end = loop {
        let n = stream.read(&mut tmp).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(end) = find_header_end(&buf) {
            break end;
        }
    };

    let head = String::from_utf8_lossy(&buf[..end]).into_owned();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let len = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[end..].to_vec();
    while body.len() < len {
        let n = stream.read(&mut tmp).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&tmp[..n]);
    }
    body.truncate(len);

    Some(CapturedRequest {
        request_line,
        headers,
        body,
    })
}
