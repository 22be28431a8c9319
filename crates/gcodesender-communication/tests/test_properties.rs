use gcodesender_communication::{AckDetector, EntrySource, TranscriptLog};
use proptest::prelude::*;

proptest! {
    #[test]
    fn ack_found_wherever_the_chunk_splits(
        prefix in "[a-z0-9 \r\n]{0,20}",
        suffix in "[a-z0-9 \r\n]{0,20}",
        split in 0usize..64,
    ) {
        let text = format!("{}ok{}", prefix, suffix);
        let split = split % (text.len() + 1);
        let (first, second) = text.split_at(split);

        let mut ack = AckDetector::new();
        let found_first = ack.scan(first);
        let found_second = ack.scan(second);
        prop_assert!(found_first || found_second);
    }

    #[test]
    fn no_ack_without_ok(chunks in proptest::collection::vec("[a-jl-np-z \n]{0,10}", 0..10)) {
        let mut ack = AckDetector::new();
        for chunk in &chunks {
            prop_assert!(!ack.scan(chunk));
        }
    }

    #[test]
    fn transcript_stays_bounded(
        capacity in 1usize..20,
        records in proptest::collection::vec(("[ -~\n\r]{0,12}", any::<bool>()), 0..60),
    ) {
        let mut log = TranscriptLog::new(capacity);
        for (text, outbound) in &records {
            let source = if *outbound { EntrySource::Local } else { EntrySource::Remote };
            log.record(text, source);
            prop_assert!(log.len() <= capacity);
        }
    }
}
