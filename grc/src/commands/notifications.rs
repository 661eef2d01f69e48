// grc/src/commands/notifications.rs
//
// USE CASE: Read a user's in-app inbox.

use comfy_table::Table;

use super::Workspace;

pub async fn execute(ws: &Workspace, user: &str, unread: bool, mark_read: bool) -> anyhow::Result<()> {
    let user_id = ws.resolve_user(user).await?;
    let inbox = ws.store.notifications_for(user_id, unread)?;
    if inbox.is_empty() {
        println!("📭 No notifications for {}", user);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["When", "Priority", "Title", "Message", "Read"]);
    for n in &inbox {
        table.add_row(vec![
            n.created_at.format("%Y-%m-%d %H:%M").to_string(),
            n.priority.to_string(),
            n.title.clone(),
            n.message.clone(),
            if n.read { "yes" } else { "no" }.to_string(),
        ]);
    }
    println!("{table}");

    if mark_read {
        for n in inbox.iter().filter(|n| !n.read) {
            ws.store.mark_notification_read(n.id)?;
        }
        println!("✅ Marked {} notification(s) as read", inbox.iter().filter(|n| !n.read).count());
    }
    Ok(())
}
