use std::sync::Arc;

use quickcheck::TestResult;
use the_edit_client::{
  ClientConfig,
  EditClient,
  EditError,
  ReplaceOne,
  SearchQuery,
  SessionId,
};
use the_edit_test::{
  Fault,
  MemoryGateway,
};

fn setup(content: impl AsRef<[u8]>) -> (Arc<MemoryGateway>, EditClient, SessionId) {
  let gateway = Arc::new(MemoryGateway::with_session("s", content));
  let client = EditClient::new(gateway.clone(), ClientConfig::default());
  (gateway, client, SessionId::new("s"))
}

fn edit_offsets(gateway: &MemoryGateway, method: &str) -> Vec<u64> {
  gateway
    .calls()
    .into_iter()
    .filter(|call| call.method == method)
    .filter_map(|call| call.offset)
    .collect()
}

#[tokio::test(flavor = "current_thread")]
async fn replace_all_rewrites_from_the_last_match() {
  let (gateway, client, session) = setup("aXbXc");
  let query = SearchQuery::new("X");

  let replaced = client
    .search()
    .replace_all(&session, &query, "YY")
    .await
    .unwrap();

  assert_eq!(replaced, 2);
  assert_eq!(gateway.content(&session), b"aYYbYYc");
  assert_eq!(edit_offsets(&gateway, "delete"), vec![3, 1]);
  assert_eq!(edit_offsets(&gateway, "insert"), vec![3, 1]);
}

#[tokio::test(flavor = "current_thread")]
async fn replace_all_with_shorter_replacement() {
  let (gateway, client, session) = setup("one--two--three");
  let replaced = client
    .search()
    .replace_all(&session, &SearchQuery::new("--"), "-")
    .await
    .unwrap();
  assert_eq!(replaced, 2);
  assert_eq!(gateway.content(&session), b"one-two-three");
}

#[tokio::test(flavor = "current_thread")]
async fn replace_all_respects_case_range_and_limit() {
  let (gateway, client, session) = setup("x.X.x.X");

  let query = SearchQuery::new("x").case_insensitive(true).offset(1).limit(2);
  let replaced = client
    .search()
    .replace_all(&session, &query, "__")
    .await
    .unwrap();

  assert_eq!(replaced, 2);
  assert_eq!(gateway.content(&session), b"x.__.__.X");
}

#[tokio::test(flavor = "current_thread")]
async fn replace_all_without_matches_edits_nothing() {
  let (gateway, client, session) = setup("abc");
  let replaced = client
    .search()
    .replace_all(&session, &SearchQuery::new("zz"), "y")
    .await
    .unwrap();
  assert_eq!(replaced, 0);
  assert_eq!(gateway.methods(), vec!["search"]);
}

#[tokio::test(flavor = "current_thread")]
async fn replace_all_stops_at_the_first_failure() {
  let (gateway, client, session) = setup("aXbXc");
  // The first delete issued is the one at offset 3.
  gateway.fail_next("delete", Fault::ZeroSerial);

  let err = client
    .search()
    .replace_all(&session, &SearchQuery::new("X"), "Y")
    .await
    .unwrap_err();

  assert!(matches!(err, EditError::EditFailed { op: "delete" }));
  assert_eq!(edit_offsets(&gateway, "delete"), vec![3]);
  assert_eq!(gateway.count_calls("insert"), 0);
  assert!(!gateway.is_paused(&session));
  assert_eq!(gateway.content(&session), b"aXbXc");
}

#[tokio::test(flavor = "current_thread")]
async fn search_failure_is_typed() {
  let (gateway, client, session) = setup("abc");
  gateway.fail_next("search", Fault::Transport);

  let err = client
    .search()
    .search(&session, &SearchQuery::new("b"))
    .await
    .unwrap_err();
  assert!(matches!(err, EditError::SearchFailed { .. }));
  assert!(err.to_string().contains("injected search failure"));
}

#[tokio::test(flavor = "current_thread")]
async fn empty_pattern_is_rejected_locally() {
  let (gateway, client, session) = setup("abc");
  let err = client
    .search()
    .replace_all(&session, &SearchQuery::new(""), "x")
    .await
    .unwrap_err();
  assert!(matches!(err, EditError::EmptyPayload { op: "search" }));
  assert!(gateway.methods().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn replace_one_reports_where_to_continue() {
  let (gateway, client, session) = setup("aXbXc");

  let first = client
    .search()
    .replace_one(&session, &SearchQuery::new("X"), "YY")
    .await
    .unwrap();
  assert_eq!(first.as_pair(), (true, 3));
  assert_eq!(gateway.content(&session), b"aYYbXc");

  let next = SearchQuery::new("X").offset(first.next_offset().unwrap());
  let second = client
    .search()
    .replace_one(&session, &next, "YY")
    .await
    .unwrap();
  assert_eq!(second.as_pair(), (true, 6));
  assert_eq!(gateway.content(&session), b"aYYbYYc");

  let done = SearchQuery::new("X").offset(second.next_offset().unwrap());
  let third = client
    .search()
    .replace_one(&session, &done, "YY")
    .await
    .unwrap();
  assert_eq!(third, ReplaceOne::NotFound);
  assert_eq!(third.as_pair(), (false, -1));
}

#[tokio::test(flavor = "current_thread")]
async fn replace_one_skips_its_own_replacement() {
  // The replacement contains the pattern; continuing from the returned
  // offset must not find it again.
  let (gateway, client, session) = setup("ab");
  let query = SearchQuery::new("a");

  let first = client
    .search()
    .replace_one(&session, &query, "aa")
    .await
    .unwrap();
  assert_eq!(first.next_offset(), Some(2));

  let again = client
    .search()
    .replace_one(&session, &query.clone().offset(2), "aa")
    .await
    .unwrap();
  assert_eq!(again, ReplaceOne::NotFound);
  assert_eq!(gateway.content(&session), b"aab");
}

#[tokio::test(flavor = "current_thread")]
async fn replace_one_searches_with_limit_one() {
  let (gateway, client, session) = setup("XXX");
  client
    .search()
    .replace_one(&session, &SearchQuery::new("X").limit(10), "Y")
    .await
    .unwrap();
  assert_eq!(gateway.content(&session), b"YXX");
}

fn naive_replace(content: &[u8], pattern: &[u8], replacement: &[u8]) -> (Vec<u8>, usize) {
  let mut out = Vec::new();
  let mut count = 0;
  let mut at = 0;
  while at < content.len() {
    if content[at..].starts_with(pattern) {
      out.extend_from_slice(replacement);
      at += pattern.len();
      count += 1;
    } else {
      out.push(content[at]);
      at += 1;
    }
  }
  (out, count)
}

fn alphabet(bytes: Vec<u8>, letters: &[u8]) -> Vec<u8> {
  bytes
    .into_iter()
    .map(|byte| letters[byte as usize % letters.len()])
    .collect()
}

quickcheck::quickcheck! {
  fn replace_all_matches_a_forward_rewrite(
    content: Vec<u8>,
    pattern: Vec<u8>,
    replacement: Vec<u8>
  ) -> TestResult {
    let content = alphabet(content, b"abX");
    let pattern = alphabet(pattern.into_iter().take(3).collect(), b"abX");
    let replacement = alphabet(replacement.into_iter().take(4).collect(), b"XYa");
    if pattern.is_empty() {
      return TestResult::discard();
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
      .build()
      .unwrap();
    let (gateway, client, session) = setup(&content);
    let replaced = runtime
      .block_on(
        client
          .search()
          .replace_all(&session, &SearchQuery::new(pattern.clone()), replacement.clone()),
      )
      .unwrap();

    let (expected, count) = naive_replace(&content, &pattern, &replacement);
    let offsets = edit_offsets(&gateway, "delete");
    let descending = offsets.windows(2).all(|pair| pair[0] > pair[1]);
    TestResult::from_bool(
      replaced == count
        && offsets.len() == count
        && descending
        && gateway.content(&session) == expected,
    )
  }
}
