use shared_types::ReviewItem;

/// Classification policy handed to the model. The reply must be a single
/// JSON object with no surrounding prose.
pub fn build_system_prompt() -> String {
    r#"Ты — аналитик банковских выписок. Тебе передают кредитовые (входящие) операции по счету предпринимателя, которые не удалось классифицировать по ключевым словам.

Для каждой операции реши, является ли она выручкой (revenue) — оплатой за товары, работы или услуги от клиентов, в том числе через маркетплейсы и эквайринг.

НЕ является выручкой: займы и кредиты, возвраты, переводы собственных средств между счетами, снятие и внесение наличных через терминалы, депозиты и проценты, дивиденды, зарплата, налоговые возвраты, пополнения счета самим владельцем.

Пополнение от контрагента-юрлица или ИП с назначением, похожим на расчет за товар или услугу, считается выручкой. Пополнение без внятного назначения от самого владельца — нет.

Ответь ОДНИМ JSON-объектом без пояснений и без markdown:
{"transactions": [{"id": "<id>", "is_revenue": true|false, "reason": "<краткое объяснение>"}]}

Включи в ответ каждую переданную операцию ровно один раз, сохранив её id без изменений."#
        .to_string()
}

/// User message carrying the ambiguous subset as `transactions_for_review`
pub fn build_user_prompt(items: &[ReviewItem]) -> String {
    let payload = serde_json::json!({ "transactions_for_review": items });
    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_carries_items() {
        let items = vec![ReviewItem {
            id: "s_1".to_string(),
            date: Some("2024-05-10".to_string()),
            amount: 300000.0,
            purpose: "Пополнение счета от ИП Ахметов".to_string(),
            sender: "ИП Ахметов".to_string(),
            correspondent: String::new(),
            bin: None,
            comment: None,
        }];
        let prompt = build_user_prompt(&items);
        assert!(prompt.contains("transactions_for_review"));
        assert!(prompt.contains("s_1"));
        assert!(prompt.contains("Ахметов"));
    }

    #[test]
    fn test_system_prompt_demands_strict_json() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("transactions"));
        assert!(prompt.contains("is_revenue"));
    }
}
