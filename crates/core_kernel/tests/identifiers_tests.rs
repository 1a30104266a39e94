//! Unit tests for the Identifiers module

use core_kernel::{
    AccountId, MeterId, ReadingId, TariffId, BillId, BillLineId,
    PaymentId, AllocationId, CarryForwardId, AuditEventId,
};
use uuid::Uuid;

mod creation {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = MeterId::new();
        let id2 = MeterId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = PaymentId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let id2 = PaymentId::new_v7();
        let uuid1: Uuid = id1.into();
        let uuid2: Uuid = id2.into();
        assert!(uuid1 < uuid2);
    }
}

mod display {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert!(AccountId::new().to_string().starts_with("ACC-"));
        assert!(MeterId::new().to_string().starts_with("MTR-"));
        assert!(ReadingId::new().to_string().starts_with("RDG-"));
        assert!(TariffId::new().to_string().starts_with("TRF-"));
        assert!(BillId::new().to_string().starts_with("BIL-"));
        assert!(BillLineId::new().to_string().starts_with("BLN-"));
        assert!(PaymentId::new().to_string().starts_with("PAY-"));
        assert!(AllocationId::new().to_string().starts_with("ALC-"));
        assert!(CarryForwardId::new().to_string().starts_with("CFW-"));
        assert!(AuditEventId::new().to_string().starts_with("AUD-"));
    }
}

mod parsing {
    use super::*;

    #[test]
    fn test_round_trip_with_prefix() {
        let original = BillId::new();
        let parsed: BillId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_parse_bare_uuid() {
        let uuid = Uuid::new_v4();
        let parsed: AccountId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed, AccountId::from(uuid));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!("not-a-uuid".parse::<BillId>().is_err());
    }
}

mod serde_roundtrip {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        let id = PaymentId::new();
        let json = serde_json::to_string(&id).unwrap();
        // transparent newtype: serializes as the bare uuid string
        assert!(json.contains(&id.as_uuid().to_string()));
        let back: PaymentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
