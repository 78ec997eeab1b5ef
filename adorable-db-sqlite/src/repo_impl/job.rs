use super::*;

impl<C> JobResultRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn record_job_result(&self, result: &JobResult) -> Result<()> {
        record_job_result(&mut self.sqlite_conn(), result)
    }
    fn load_job_results(&self, limit: u32) -> Result<Vec<JobResult>> {
        load_job_results(&mut self.sqlite_conn(), limit)
    }
}

fn record_job_result(conn: &mut SqliteConnection, result: &JobResult) -> Result<()> {
    let JobResult {
        id,
        job_name,
        payload,
        attempts,
        status,
        last_error,
        finished_at,
    } = result;
    diesel::insert_into(schema::job_results::table)
        .values(&models::JobResultEntity {
            id: id.to_string(),
            job_name: job_name.clone(),
            payload: payload.clone(),
            attempts: *attempts as i32,
            status: status.as_ref().to_owned(),
            last_error: last_error.clone(),
            finished_at: finished_at.as_millis(),
        })
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn load_job_results(conn: &mut SqliteConnection, limit: u32) -> Result<Vec<JobResult>> {
    use schema::job_results::dsl;
    dsl::job_results
        .order_by(dsl::finished_at.desc())
        .limit(to_limit(limit))
        .load::<models::JobResultEntity>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(
            |models::JobResultEntity {
                 id,
                 job_name,
                 payload,
                 attempts,
                 status,
                 last_error,
                 finished_at,
             }|
             -> Result<JobResult> {
                Ok(JobResult {
                    id: id.into(),
                    job_name,
                    payload,
                    attempts: attempts.max(0) as u32,
                    status: parse_enum(&status)?,
                    last_error,
                    finished_at: Timestamp::from_millis(finished_at),
                })
            },
        )
        .collect()
}
