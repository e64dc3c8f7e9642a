//! 发票渲染
//!
//! 已落库账单 → 可打印文档的纯函数。不读任何外部状态，同一张账单
//! 永远渲染出同一份发票。

use shared::draft::TxMode;
use shared::models::{Bill, Invoice, InvoiceLine};
use shared::pricing;

/// Render the printable invoice for a persisted bill
pub fn render(bill: &Bill) -> Invoice {
    let title = match bill.mode {
        TxMode::Sell => "Bill",
        TxMode::Return => "Return",
    };

    let lines: Vec<InvoiceLine> = bill
        .items
        .iter()
        .map(|item| InvoiceLine {
            name: item.name.clone(),
            qty: item.qty,
            discount: if item.discount.is_empty() {
                "-".to_string()
            } else {
                item.discount.clone()
            },
            line_total: pricing::round2(item.final_price * rust_decimal::Decimal::from(item.qty)),
        })
        .collect();

    Invoice {
        bill_id: bill.id.clone().unwrap_or_default(),
        title: title.to_string(),
        date: bill.date,
        customer: bill.customer.clone(),
        lines: lines.clone(),
        total: bill.total,
        html: render_html(bill, title, &lines),
    }
}

fn render_html(bill: &Bill, title: &str, lines: &[InvoiceLine]) -> String {
    let mut rows = String::new();
    for (i, line) in lines.iter().enumerate() {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            i + 1,
            line.name,
            line.qty,
            line.discount,
            line.line_total,
        ));
    }

    format!(
        r#"<html><head><title>{title} {bill_id}</title></head><body>
<h2>Till | Smart Retail {title}</h2>
<div class="info">
<p><strong>Customer Name:</strong> {customer}</p>
<p><strong>Phone Number:</strong> {phone}</p>
<p><strong>Date:</strong> {date}</p>
</div>
<table><thead><tr><th>#</th><th>Name</th><th>Qty</th><th>Discount</th><th>Price</th></tr></thead>
<tbody>
{rows}<tr><td colspan="4"><strong>Total</strong></td><td><strong>{total}</strong></td></tr>
</tbody></table>
</body></html>"#,
        title = title,
        bill_id = bill.id.clone().unwrap_or_default(),
        customer = bill.customer.name,
        phone = bill.customer.phone,
        date = bill.date.format("%Y-%m-%d"),
        rows = rows,
        total = bill.total,
    )
}
