//! Joins the pages of a cursor stream into one JSON array.

use crate::cursor::{CursorStream, StreamItem};
use crate::error::Result;

fn trim(bytes: &[u8]) -> &[u8] {
    bytes.trim_ascii()
}

/// Returns the elements of a JSON array literal without the brackets, or
/// `None` if `page` is not an array.
fn array_elements(page: &[u8]) -> Option<&[u8]> {
    let page = trim(page);
    let inner = page.strip_prefix(b"[")?.strip_suffix(b"]")?;
    Some(trim(inner))
}

/// Drains `stream` and concatenates its pages into a single JSON array.
///
/// A first page that is not an array is returned verbatim once the stream
/// ends. Zero pages produce `[]`. The first `Error` item is returned as the
/// error.
pub async fn aggregate(stream: &mut CursorStream) -> Result<Vec<u8>> {
    let mut merged = vec![b'['];
    let mut verbatim: Option<Vec<u8>> = None;
    let mut first = true;

    while let Some(item) = stream.next().await {
        match item {
            StreamItem::Page(page) => {
                if verbatim.is_some() {
                    continue;
                }
                if first && array_elements(&page).is_none() {
                    verbatim = Some(page);
                    continue;
                }
                let elements = array_elements(&page).unwrap_or_else(|| trim(&page));
                if !elements.is_empty() {
                    if merged.len() > 1 {
                        merged.push(b',');
                    }
                    merged.extend_from_slice(elements);
                }
                first = false;
            }
            StreamItem::Terminal => break,
            StreamItem::Error(err) => return Err(err),
        }
    }

    if let Some(page) = verbatim {
        return Ok(page);
    }
    merged.push(b']');
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn page(json: &str) -> StreamItem {
        StreamItem::Page(json.as_bytes().to_vec())
    }

    async fn merged(items: Vec<StreamItem>) -> Result<String> {
        let mut stream = CursorStream::from_items(items);
        let bytes = aggregate(&mut stream).await?;
        Ok(String::from_utf8(bytes).unwrap())
    }

    #[tokio::test]
    async fn test_pages_are_concatenated_in_order() {
        let out = merged(vec![page(r#"[{"a":1},{"a":2}]"#), page(r#"[{"a":3}]"#), StreamItem::Terminal])
            .await
            .unwrap();
        assert_eq!(out, r#"[{"a":1},{"a":2},{"a":3}]"#);
    }

    #[tokio::test]
    async fn test_two_document_pages() {
        let out = merged(vec![page(r#"[{"_id":"1234"}]"#), page(r#"[{"_id":"4321"}]"#), StreamItem::Terminal])
            .await
            .unwrap();
        assert_eq!(out, r#"[{"_id":"1234"},{"_id":"4321"}]"#);
    }

    #[tokio::test]
    async fn test_object_page_is_unchanged() {
        let out = merged(vec![page(r#"{"foo":"bar"}"#), StreamItem::Terminal]).await.unwrap();
        assert_eq!(out, r#"{"foo":"bar"}"#);
    }

    #[tokio::test]
    async fn test_empty_pages_do_not_add_commas() {
        let out = merged(vec![page("[]"), page("[1]"), page(" [ ] "), page("[2,3]"), StreamItem::Terminal])
            .await
            .unwrap();
        assert_eq!(out, "[1,2,3]");
    }

    #[tokio::test]
    async fn test_zero_pages_yield_empty_array() {
        assert_eq!(merged(vec![StreamItem::Terminal]).await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_non_array_first_page_is_returned_verbatim() {
        let out = merged(vec![page(r#"{"count": 3}"#), page("[1]"), StreamItem::Terminal])
            .await
            .unwrap();
        assert_eq!(out, r#"{"count": 3}"#);
    }

    #[tokio::test]
    async fn test_error_item_is_returned() {
        let err = merged(vec![page("[1]"), StreamItem::Error(Error::Canceled)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Canceled));
    }

    #[tokio::test]
    async fn test_missing_terminal_is_stream_interrupted() {
        let err = merged(vec![page("[1]")]).await.unwrap_err();
        assert!(matches!(err, Error::StreamInterrupted));
    }

    #[tokio::test]
    async fn test_stream_yields_none_after_final_item() {
        let mut stream = CursorStream::from_items(vec![page("[1]"), StreamItem::Terminal, page("[2]")]);
        assert!(matches!(stream.next().await, Some(StreamItem::Page(_))));
        assert!(matches!(stream.next().await, Some(StreamItem::Terminal)));
        assert!(stream.is_finished());
        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_trait_yields_same_items() {
        use futures::StreamExt;

        let stream = CursorStream::from_items(vec![page("[1]"), page("[2]"), StreamItem::Terminal]);
        let items: Vec<StreamItem> = stream.collect().await;
        assert_eq!(items.len(), 3);
        assert!(items[2].is_final());
    }

    #[test]
    fn test_array_elements() {
        assert_eq!(array_elements(b" [1, 2] "), Some(b"1, 2".as_slice()));
        assert_eq!(array_elements(b"[ ]"), Some(b"".as_slice()));
        assert_eq!(array_elements(b"{\"a\":1}"), None);
    }
}
