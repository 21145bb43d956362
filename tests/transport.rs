// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use smartpark_rs::occupancy::evaluate;
use smartpark_rs::transport::{HttpReporter, ReportSink};
use smartpark_rs::{Rect, Zone, ZoneSet};

struct Captured {
    request_line: String,
    content_type: Option<String>,
    body: String,
}

/// 一次性 HTTP 接收端: 读取一个请求, 回复给定状态码
fn serve_once(status: &'static str) -> Result<(String, JoinHandle<Result<Captured>>)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let url = format!("http://{}/actualizar", listener.local_addr()?);
    let handle = std::thread::spawn(move || -> Result<Captured> {
        let (stream, _) = listener.accept()?;
        let mut reader = BufReader::new(stream.try_clone()?);

        let mut request_line = String::new();
        reader.read_line(&mut request_line)?;

        let mut content_length = 0usize;
        let mut content_type = None;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line)?;
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                match name.to_ascii_lowercase().as_str() {
                    "content-length" => content_length = value.trim().parse()?,
                    "content-type" => content_type = Some(value.trim().to_string()),
                    _ => {}
                }
            }
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body)?;

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            status
        )?;
        stream.flush()?;

        Ok(Captured {
            request_line: request_line.trim_end().to_string(),
            content_type,
            body: String::from_utf8(body)?,
        })
    });
    Ok((url, handle))
}

fn sample_report() -> smartpark_rs::OccupancyReport {
    let zones = ZoneSet::new(vec![
        Zone::new("5", Rect::new(100, 100, 200, 200)),
        Zone::new("6", Rect::new(300, 300, 400, 400)),
    ]);
    evaluate(&zones, &[Rect::new(120, 120, 180, 180)])
}

#[test]
fn posts_report_as_json_array() -> Result<()> {
    let (url, handle) = serve_once("200 OK")?;
    let mut reporter = HttpReporter::new(url, Duration::from_secs(5));
    reporter.send(&sample_report())?;

    let captured = handle.join().expect("receiver thread panicked")?;
    assert!(captured.request_line.starts_with("POST /actualizar"));
    assert_eq!(captured.content_type.as_deref(), Some("application/json"));

    let body: Value = serde_json::from_str(&captured.body)?;
    assert_eq!(
        body,
        serde_json::json!([
            {"id": "5", "status": "occupied"},
            {"id": "6", "status": "available"}
        ])
    );
    Ok(())
}

#[test]
fn server_error_is_reported() -> Result<()> {
    let (url, handle) = serve_once("500 Internal Server Error")?;
    let mut reporter = HttpReporter::new(url, Duration::from_secs(5));
    assert!(reporter.send(&sample_report()).is_err());
    handle.join().expect("receiver thread panicked")?;
    Ok(())
}

#[test]
fn unreachable_endpoint_is_reported() -> Result<()> {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?.port()
    };
    let mut reporter = HttpReporter::new(
        format!("http://127.0.0.1:{}/actualizar", port),
        Duration::from_secs(1),
    );
    assert!(reporter.send(&sample_report()).is_err());
    Ok(())
}
