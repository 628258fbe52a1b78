use std::{convert::Infallible, io, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use formspool::{human_bytes, Multipart, StoredUpload, UploadStore};
use futures_util::{StreamExt, TryStreamExt};
use http_body_util::{combinators::BoxBody, BodyExt, BodyStream, Full, StreamBody};
use hyper::{
    body::{Frame, Incoming},
    header::{self, HeaderValue},
    Method, Request, Response, StatusCode,
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use tokio_util::io::ReaderStream;

type Body = BoxBody<Bytes, io::Error>;

// Routes a request to the page, download or upload handler.
async fn handle(store: Arc<UploadStore>, req: Request<Incoming>) -> Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let res = match (method, path.as_str()) {
        (Method::GET, "/") => homepage(&store),
        (Method::GET, path) if path.starts_with("/upload/") => download(&store, &path["/upload/".len()..]).await,
        (Method::GET, _) => status(StatusCode::NOT_FOUND),
        (Method::POST, "/upload") => upload(&store, req).await,
        _ => status(StatusCode::NOT_IMPLEMENTED),
    };

    Ok(res)
}

// Decode the multipart body and hand the parts to the store.
async fn upload(store: &UploadStore, req: Request<Incoming>) -> Response<Body> {
    // Extract the `multipart/form-data` boundary from the headers.
    let boundary = match formspool::boundary_from_headers(req.headers()) {
        Ok(boundary) => boundary,
        Err(err) => return text(StatusCode::BAD_REQUEST, format!("BAD REQUEST: {}", err)),
    };

    // Convert the body into a stream of data frames.
    let body_stream = BodyStream::new(req.into_body())
        .filter_map(|result| async move { result.map(|frame| frame.into_data().ok()).transpose() });

    // Parts past the spool threshold are written to disk on this task.
    let parts = match Multipart::new(body_stream, boundary) {
        Ok(multipart) => multipart.parts().await,
        Err(err) => Err(err),
    };

    let parts = match parts {
        Ok(parts) => parts,
        Err(err) => return text(StatusCode::BAD_REQUEST, format!("BAD REQUEST: {}", err)),
    };

    let store = store.clone();
    let stored = tokio::task::spawn_blocking(move || store.accept(parts)).await;

    match stored {
        Ok(Ok(stored)) => {
            for upload in stored.iter() {
                println!("Stored: {} ({})", upload.name, human_bytes(upload.size));
            }

            let mut res = status(StatusCode::FOUND);
            res.headers_mut().insert(header::LOCATION, HeaderValue::from_static("/"));
            res
        }
        Ok(Err(err)) => text(StatusCode::INTERNAL_SERVER_ERROR, format!("INTERNAL SERVER ERROR: {}", err)),
        Err(err) => text(StatusCode::INTERNAL_SERVER_ERROR, format!("INTERNAL SERVER ERROR: {}", err)),
    }
}

// Stream a stored file back with a content type guessed from its name.
async fn download(store: &UploadStore, raw_name: &str) -> Response<Body> {
    let name = percent_decode_str(raw_name).decode_utf8_lossy();

    let upload = match store.find(&name) {
        Ok(Some(upload)) => upload,
        Ok(None) => return status(StatusCode::NOT_FOUND),
        Err(err) => return text(StatusCode::INTERNAL_SERVER_ERROR, format!("INTERNAL SERVER ERROR: {}", err)),
    };

    let file = match tokio::fs::File::open(&upload.path).await {
        Ok(file) => file,
        Err(err) => return text(StatusCode::INTERNAL_SERVER_ERROR, format!("INTERNAL SERVER ERROR: {}", err)),
    };

    let stream = ReaderStream::new(file).map_ok(Frame::data);
    let mut res = Response::new(StreamBody::new(stream).boxed());

    let mime = mime_guess::from_path(&upload.name).first_or_octet_stream();
    if let Ok(val) = HeaderValue::from_str(mime.as_ref()) {
        res.headers_mut().insert(header::CONTENT_TYPE, val);
    }
    res.headers_mut().insert(header::CONTENT_LENGTH, HeaderValue::from(upload.size));

    res
}

fn homepage(store: &UploadStore) -> Response<Body> {
    match store.list() {
        Ok(uploads) => {
            let mut res = Response::new(full(render_homepage(&uploads)));
            res.headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
            res
        }
        Err(err) => text(StatusCode::INTERNAL_SERVER_ERROR, format!("INTERNAL SERVER ERROR: {}", err)),
    }
}

fn render_homepage(uploads: &[StoredUpload]) -> String {
    let rows: String = uploads
        .iter()
        .map(|upload| {
            format!(
                "<tr><td><a href=\"/upload/{}\">{}</a></td><td>{}</td></tr>",
                utf8_percent_encode(&upload.name, NON_ALPHANUMERIC),
                html_escape::encode_text(&upload.name),
                human_bytes(upload.size)
            )
        })
        .collect();

    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>formspool</title>
    <style>
    body {{ margin: 10px auto; max-width: 80ch; font-family: sans-serif; }}
    form {{ display: flex; flex-direction: column; gap: 10px; }}
    fieldset {{ display: flex; justify-content: space-between; border: none; }}
    textarea {{ padding: 10px; min-height: 80px; resize: vertical; font-family: monospace; }}
    table {{ margin: 20px 0; border-top: 1px solid #888; width: 100%; font-family: monospace; }}
    td:nth-child(2) {{ text-align: right; }}
    </style>
  </head>
  <body>
    <main>
      <h1>Upload files or text</h1>
      <form action="/upload" method="post" enctype="multipart/form-data">
        <fieldset>
          <input style="flex-grow: 1;" name="files" type="file" multiple />
          <input name="submit" type="submit" value="Upload" />
        </fieldset>
        <textarea name="text" placeholder="Lorem ipsum..."></textarea>
      </form>
      <table>
        <thead><tr><th>File</th><th>Size</th></tr></thead>
        <tbody>{}</tbody>
      </table>
    </main>
  </body>
</html>
"#,
        rows
    )
}

fn full<T: Into<Bytes>>(data: T) -> Body {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

fn status(code: StatusCode) -> Response<Body> {
    let mut res = Response::new(full(Bytes::new()));
    *res.status_mut() = code;
    res
}

fn text(code: StatusCode, body: String) -> Response<Body> {
    let mut res = Response::new(full(body));
    *res.status_mut() = code;
    res.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    res
}

#[tokio::main]
async fn main() {
    let dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "tmp".to_owned());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(8080u16);

    let store = Arc::new(UploadStore::open(dir).unwrap());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    println!("Serving at http://{}/ ...", addr);

    loop {
        let (socket, _remote_addr) = listener.accept().await.unwrap();
        let socket = hyper_util::rt::TokioIo::new(socket);
        let store = Arc::clone(&store);

        tokio::spawn(async move {
            let service = hyper::service::service_fn(move |req| handle(Arc::clone(&store), req));

            if let Err(e) = hyper::server::conn::http1::Builder::new()
                .serve_connection(socket, service)
                .await
            {
                eprintln!("server error: {}", e);
            }
        });
    }
}
