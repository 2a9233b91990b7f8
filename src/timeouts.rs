use crate::prelude::*;

/// Sweeps connections and in-flight CGI children for expired deadlines.
///
/// Runs once per poll-loop iteration rather than being armed against the
/// poller directly: with a single fixed poll timeout, a linear scan over
/// the (small) connection table after each wakeup is simpler than keeping
/// a timer wheel in sync with `mio`'s readiness events.
pub fn process(server: &mut Server, poll: &Poll) {
    let now = Instant::now();
    let Server {
        connections,
        cgi_to_client,
        ..
    } = server;

    connections.retain(|token, conn| {
        // Client inactivity timeout
        if now.duration_since(conn.last_activity) > CLIENT_TIMEOUT {
            cleanup_connection(conn, poll);
            force_cgi_timeout(conn, cgi_to_client);
            return false;
        }

        // CGI execution timeout: the child has been running too long even
        // though no readiness event has told us anything is wrong.
        if let ActiveAction::Cgi { start_time, .. } = &conn.action {
            if start_time.elapsed().as_secs() > TIMEOUT_CGI {
                force_cgi_timeout(conn, cgi_to_client);

                poll.registry()
                    .reregister(&mut conn.stream, *token, Interest::WRITABLE)
                    .ok();
            }
        }

        true
    });
}

fn cleanup_connection(conn: &mut HttpConnection, poll: &Poll) {
    let _ = poll.registry().deregister(&mut conn.stream);
    let _ = conn.stream.shutdown(Shutdown::Both);
}
