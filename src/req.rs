use actix_web::dev::RequestHead;
use actix_web::http::{header, Uri};
use awc::{Client, ClientRequest};
use url::Url;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

pub fn create_forwarded_req(client: &Client, head: &RequestHead, new_url: &Url) -> ClientRequest {
    let mut forwarded_req = client.request_from(new_url.as_str(), head).no_decompress();
    // let awc derive Host from the backend url
    forwarded_req.headers_mut().remove(header::HOST);

    match forwarded_for(head) {
        Some(value) => forwarded_req.insert_header((X_FORWARDED_FOR, value)),
        None => forwarded_req,
    }
}

pub fn create_forward_url(base: &Url, original_url: &Uri) -> Url {
    let mut new_url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    new_url.set_path(&format!("{}{}", prefix, original_url.path()));
    new_url.set_query(original_url.query());
    new_url
}

fn forwarded_for(head: &RequestHead) -> Option<String> {
    let ip = head.peer_addr?.ip().to_string();
    let existing = head
        .headers()
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok());

    Some(match existing {
        Some(existing) => format!("{}, {}", existing, ip),
        None => ip,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn forward_url_keeps_path_and_query() {
        let base = Url::parse("http://127.0.0.1:8081").unwrap();
        let uri: Uri = "/users/7?page=2".parse().unwrap();

        let url = create_forward_url(&base, &uri);
        assert_eq!(url.as_str(), "http://127.0.0.1:8081/users/7?page=2");
    }

    #[test]
    fn forward_url_joins_base_path() {
        let base = Url::parse("http://backend.local/api/").unwrap();
        let uri: Uri = "/health".parse().unwrap();

        let url = create_forward_url(&base, &uri);
        assert_eq!(url.as_str(), "http://backend.local/api/health");
    }

    #[test]
    fn forward_url_without_query() {
        let base = Url::parse("https://duckduckgo.com").unwrap();
        let uri: Uri = "/".parse().unwrap();

        let url = create_forward_url(&base, &uri);
        assert_eq!(url.as_str(), "https://duckduckgo.com/");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn forwarded_for_appends_peer_ip() {
        let req = TestRequest::default()
            .peer_addr("10.0.0.5:40000".parse().unwrap())
            .insert_header((X_FORWARDED_FOR, "192.168.1.1"))
            .to_http_request();

        assert_eq!(
            forwarded_for(req.head()).as_deref(),
            Some("192.168.1.1, 10.0.0.5")
        );
    }

    #[test]
    fn forwarded_for_needs_peer() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(forwarded_for(req.head()), None);
    }
}
