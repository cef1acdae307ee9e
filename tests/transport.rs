//! Transport tests: chunked delivery, reassembly, and the save latch.

mod common;

use std::sync::{Arc, Barrier, mpsc};
use std::thread;

use pagezip::transport::{DOWNLOAD_METHOD, FilenameConflictAction, sink_fn};
use pagezip::{
    Archive, ChunkAssembler, DownloadMessage, Error, SavePayload, SaveSession, TransportOptions,
    send_page,
};

use common::sample_page;

fn payload_chars() -> usize {
    SavePayload::from_page(&sample_page())
        .to_json()
        .unwrap()
        .chars()
        .count()
}

#[test]
fn test_small_page_is_one_finished_message() {
    let mut messages = Vec::<DownloadMessage>::new();
    let sent = send_page(&sample_page(), &TransportOptions::new(), &mut messages).unwrap();
    assert_eq!(sent, 1);

    let message = &messages[0];
    assert_eq!(message.method, DOWNLOAD_METHOD);
    assert!(!message.truncated);
    assert!(message.finished);
    assert_eq!(message.payload().unwrap().into_page().content, sample_page().content);
}

#[test]
fn test_large_page_is_split_and_reassembled() {
    let total = payload_chars();
    let bound = total / 3 + 1;
    let options = TransportOptions::new()
        .max_content_size(bound)
        .filename("sample.html")
        .filename_conflict_action(FilenameConflictAction::Overwrite);

    let mut messages = Vec::<DownloadMessage>::new();
    let sent = send_page(&sample_page(), &options, &mut messages).unwrap();
    assert_eq!(sent, total.div_ceil(bound));
    assert_eq!(messages.len(), sent);
    assert!(messages.iter().all(|m| m.truncated));
    assert!(messages.iter().all(|m| m.filename == "sample.html"));
    let finished: Vec<_> = messages.iter().map(|m| m.finished).collect();
    assert_eq!(finished.iter().filter(|f| **f).count(), 1);
    assert_eq!(finished.last(), Some(&true));

    let mut assembler = ChunkAssembler::new();
    let mut complete = None;
    for message in messages {
        assert!(complete.is_none());
        complete = assembler.push(message).unwrap();
    }
    let complete = complete.expect("last piece completes the payload");
    assert!(!assembler.is_pending());

    let bytes = complete.write_archive().unwrap();
    let archive = Archive::open(bytes).unwrap();
    assert_eq!(archive.len(), 5);
    assert_eq!(archive.read_text("index.html").unwrap(), sample_page().content);
}

#[test]
fn test_messages_use_camel_case_fields() {
    let mut messages = Vec::<DownloadMessage>::new();
    send_page(
        &sample_page(),
        &TransportOptions::new().insert_text_body(true),
        &mut messages,
    )
    .unwrap();
    let json = serde_json::to_value(&messages[0]).unwrap();
    assert_eq!(json["method"], "downloads.download");
    assert_eq!(json["insertTextBody"], true);
    assert_eq!(json["filenameConflictAction"], "uniquify");
    assert!(json.get("filenameReplacementCharacter").is_some());
}

#[test]
fn test_sink_error_stops_sending() {
    let mut delivered = 0;
    let mut sink = sink_fn(|_message: DownloadMessage| {
        delivered += 1;
        if delivered == 2 {
            return Err(Error::Fetch("host closed".into()));
        }
        Ok(())
    });
    let options = TransportOptions::new().max_content_size(16);
    let err = send_page(&sample_page(), &options, &mut sink).unwrap_err();
    assert!(matches!(err, Error::Fetch(_)));
    assert_eq!(delivered, 2);
}

#[test]
fn test_overlapping_saves_are_rejected() {
    let session = Arc::new(SaveSession::new());
    let entered = Arc::new(Barrier::new(2));
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let worker = {
        let session = Arc::clone(&session);
        let entered = Arc::clone(&entered);
        thread::spawn(move || {
            let mut first = true;
            let mut sink = sink_fn(move |_message: DownloadMessage| {
                if first {
                    first = false;
                    entered.wait();
                    release_rx.recv().ok();
                }
                Ok(())
            });
            session.save(&sample_page(), &TransportOptions::new(), &mut sink)
        })
    };

    entered.wait();
    assert!(session.is_processing());
    let mut messages = Vec::<DownloadMessage>::new();
    let err = session
        .save(&sample_page(), &TransportOptions::new(), &mut messages)
        .unwrap_err();
    assert!(matches!(err, Error::CaptureInProgress));
    assert!(messages.is_empty());

    release_tx.send(()).unwrap();
    assert_eq!(worker.join().unwrap().unwrap(), 1);
    assert!(!session.is_processing());
    assert_eq!(
        session
            .save(&sample_page(), &TransportOptions::new(), &mut messages)
            .unwrap(),
        1
    );
}
