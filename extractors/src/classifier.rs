use crate::records::NormalizedRecord;

/// Cash deposited by the account holder through a terminal; checked before
/// anything else so "пополнение" wording cannot demote these to ambiguous
const TERMINAL_DEPOSIT_MARKERS: &[&str] = &[
    "cash in",
    "cash-in",
    "терминал id",
    "наличность в терминалах",
    "пополнение через терминал",
    "взнос наличными через терминал",
    "внесение наличных через терминал",
];

const NON_REVENUE_MARKERS: &[&str] = &[
    // loans
    "займ",
    "заем",
    "кредит",
    "ссуда",
    "loan",
    "транш",
    "микрокредит",
    "погашение",
    // own funds moved between accounts
    "собственные средства",
    "собственных средств",
    "между своими счетами",
    "со своего счета",
    "на свой счет",
    "внутренний перевод",
    "own funds",
    "own account",
    // refunds
    "возврат",
    "refund",
    "chargeback",
    "сторно",
    // deposits
    "депозит",
    "вклад",
    "deposit",
    // dividends and equity
    "дивиден",
    "dividend",
    "уставный капитал",
    "взнос учредителя",
    // payroll and social
    "заработн",
    "зарплат",
    "salary",
    "отпускны",
    "пособи",
    "пенси",
    "алимент",
    // taxes, duties, penalties
    "налог",
    "госпошлина",
    "пеня",
    "пени",
    "штраф",
    "неустойка",
    "tax",
    "penalty",
    // fx and card movements
    "конвертац",
    "обмен валют",
    "продажа валюты",
    "card2card",
    "card to card",
];

const REVENUE_MARKERS: &[&str] = &[
    "оплата",
    "оплату",
    "платеж",
    "платёж",
    "payment",
    "по счету",
    "по счёту",
    "по сф",
    "счет-фактур",
    "счёт-фактур",
    "invoice",
    "инвойс",
    "по договору",
    "contract",
    "контракт",
    "за товар",
    "за продукцию",
    "за услуг",
    "услуги",
    "за работы",
    "поставка",
    "delivery",
    "отгрузка",
    "реализац",
    "продажа товар",
    "sale of",
    "выручка",
    "revenue",
    "proceeds",
    "предоплата",
    "эквайринг",
    "acquiring",
    "kaspi",
    "каспи",
    "wildberries",
    "ozon",
    "озон",
    "маркетплейс",
    "marketplace",
];

/// Wording that needs counterparty context before it can be judged
const CONTEXT_MARKERS: &[&str] = &["пополнение", "top-up", "top up", "перевод", "transfer"];

/// Outcome of the deterministic keyword pass
#[derive(Debug, Clone, PartialEq)]
pub enum HeuristicClass {
    Revenue { reason: String },
    NonRevenue { reason: String },
    Ambiguous { reason: String, possible_non_revenue: bool },
}

/// Partition a transaction by keyword lookup over purpose and sender.
/// Rule order is significant: terminal self-deposits dominate, then
/// non-revenue markers, then revenue markers, then context-dependent wording.
pub fn classify(record: &NormalizedRecord) -> HeuristicClass {
    let purpose = record.purpose.to_lowercase();
    let sender = record.sender.to_lowercase();

    if purpose.trim().is_empty() && sender.trim().is_empty() {
        return HeuristicClass::Ambiguous {
            reason: "no text".to_string(),
            possible_non_revenue: false,
        };
    }

    let combined = format!("{} {}", purpose, sender);

    if let Some(marker) = find_marker(&combined, TERMINAL_DEPOSIT_MARKERS) {
        return HeuristicClass::NonRevenue {
            reason: format!("terminal self-deposit: {marker}"),
        };
    }

    if let Some(marker) = find_marker(&combined, NON_REVENUE_MARKERS) {
        return HeuristicClass::NonRevenue {
            reason: format!("non-revenue marker: {marker}"),
        };
    }

    if let Some(marker) = find_marker(&purpose, REVENUE_MARKERS) {
        return HeuristicClass::Revenue {
            reason: format!("revenue marker: {marker}"),
        };
    }

    if find_marker(&purpose, CONTEXT_MARKERS).is_some() {
        return HeuristicClass::Ambiguous {
            reason: "needs context".to_string(),
            possible_non_revenue: true,
        };
    }

    HeuristicClass::Ambiguous {
        reason: "no explicit markers".to_string(),
        possible_non_revenue: false,
    }
}

fn find_marker(text: &str, markers: &[&'static str]) -> Option<&'static str> {
    markers.iter().copied().find(|m| text.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(purpose: &str, sender: &str) -> NormalizedRecord {
        NormalizedRecord {
            raw_amount: String::new(),
            amount: 0.0,
            value_date: None,
            purpose: purpose.to_string(),
            sender: sender.to_string(),
            correspondent: String::new(),
            bin: None,
        }
    }

    #[test]
    fn test_empty_text_is_ambiguous() {
        let class = classify(&record("", ""));
        assert!(matches!(class, HeuristicClass::Ambiguous { ref reason, .. } if reason == "no text"));
    }

    #[test]
    fn test_terminal_deposit_beats_topup() {
        // "Пополнение через терминал" contains a context marker too; the
        // terminal rule must win
        let class = classify(&record("Пополнение через терминал №5", ""));
        assert!(matches!(class, HeuristicClass::NonRevenue { .. }));

        let class = classify(&record("Cash In Терминал ID 42", ""));
        assert!(matches!(class, HeuristicClass::NonRevenue { ref reason } if reason.contains("terminal")));
    }

    #[test]
    fn test_non_revenue_markers() {
        for purpose in [
            "Возврат аванса",
            "Получение займа по договору",
            "Перевод собственных средств",
            "Выплата дивидендов",
            "Возврат НДС, налог",
        ] {
            let class = classify(&record(purpose, ""));
            assert!(
                matches!(class, HeuristicClass::NonRevenue { .. }),
                "expected non-revenue for {purpose}"
            );
        }
    }

    #[test]
    fn test_non_revenue_marker_in_sender() {
        let class = classify(&record("Зачисление", "АО Банк, выдача кредита"));
        assert!(matches!(class, HeuristicClass::NonRevenue { .. }));
    }

    #[test]
    fn test_revenue_markers() {
        for purpose in [
            "Оплата по СФ №12",
            "Оплата за услуги",
            "Оплата по договору",
            "Payment for delivery under invoice 77",
            "Выручка от реализации",
        ] {
            let class = classify(&record(purpose, "ТОО Клиент"));
            assert!(
                matches!(class, HeuristicClass::Revenue { .. }),
                "expected revenue for {purpose}"
            );
        }
    }

    #[test]
    fn test_revenue_marker_only_in_purpose() {
        // A marketplace name in the sender alone is not enough
        let class = classify(&record("Зачисление средств", "Kaspi Bank"));
        assert!(matches!(class, HeuristicClass::Ambiguous { .. }));
    }

    #[test]
    fn test_topup_needs_context() {
        let class = classify(&record("Пополнение счета от ИП Ахметов", ""));
        match class {
            HeuristicClass::Ambiguous {
                reason,
                possible_non_revenue,
            } => {
                assert_eq!(reason, "needs context");
                assert!(possible_non_revenue);
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_no_markers() {
        let class = classify(&record("Зачисление средств", "ИП Иванов"));
        assert!(
            matches!(class, HeuristicClass::Ambiguous { ref reason, .. } if reason == "no explicit markers")
        );
    }

    #[test]
    fn test_rule_order_non_revenue_beats_revenue() {
        // Both a refund and a payment marker: refund wins by rule order
        let class = classify(&record("Возврат оплаты по договору", ""));
        assert!(matches!(class, HeuristicClass::NonRevenue { .. }));
    }
}
