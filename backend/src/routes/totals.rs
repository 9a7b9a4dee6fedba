use rocket::serde::json::Json;

use crate::db::TallyDb;
use crate::error::TallyError;
use crate::models::Totals;
use crate::tally;

// Route to get per-candidate totals across every station
#[get("/totals")]
pub async fn totals(db: TallyDb) -> Result<Json<Totals>, TallyError> {
    db.run(tally::totals).await.map(Json)
}
