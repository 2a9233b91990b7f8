use crate::prelude::*;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::sync::atomic::{AtomicBool, Ordering};

/// How long a single `Poll::poll` call blocks before returning control to the
/// loop so the connection/CGI timeout tables can be swept. The loop does not
/// compute an exact next-deadline; a short fixed wait keeps idle-timeout and
/// CGI-timeout resolution bounded without needing a timer wheel synced to
/// `mio`'s readiness events.
const POLL_TIMEOUT: Duration = Duration::from_millis(250);
const EVENTS_CAPACITY: usize = 1024;

pub struct Server {
    pub listeners: HashMap<Token, TcpListener>,
    pub listener_configs: HashMap<Token, Vec<Arc<ServerConfig>>>,
    pub connections: HashMap<Token, HttpConnection>,
    pub cgi_to_client: HashMap<Token, Token>,
    pub zombie_purgatory: Vec<std::process::Child>,
    next_token: usize,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Validates the parsed configuration, groups server blocks sharing a
    /// `(host, port)` pair behind one listener (virtual hosting), and binds
    /// and registers a listener per group.
    pub fn new(config: Config, poll: &Poll) -> Result<Self> {
        let servers = validate_configs(config.servers);
        if servers.is_empty() {
            return Err("no valid server blocks remain after configuration validation".into());
        }

        let mut groups: HashMap<(String, u16), Vec<Arc<ServerConfig>>> = HashMap::new();
        for cfg in servers {
            let cfg = Arc::new(cfg);
            for &port in &cfg.ports {
                groups
                    .entry((cfg.host.clone(), port))
                    .or_default()
                    .push(Arc::clone(&cfg));
            }
        }

        let mut listeners = HashMap::new();
        let mut listener_configs = HashMap::new();
        let mut next_token = 0usize;

        for ((host, port), cfgs) in groups {
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let mut listener = TcpListener::bind(addr)?;
            let token = Token(next_token);
            next_token += 1;

            poll.registry()
                .register(&mut listener, token, Interest::READABLE)?;

            info!(
                "listening on {} ({} virtual host{})",
                addr,
                cfgs.len(),
                if cfgs.len() == 1 { "" } else { "s" }
            );

            listeners.insert(token, listener);
            listener_configs.insert(token, cfgs);
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(SIGINT, Arc::clone(&shutdown))?;
        signal_hook::flag::register(SIGTERM, Arc::clone(&shutdown))?;

        Ok(Self {
            listeners,
            listener_configs,
            connections: HashMap::new(),
            cgi_to_client: HashMap::new(),
            zombie_purgatory: Vec::new(),
            next_token,
            shutdown,
        })
    }

    /// The main event loop. Single-threaded: one `Poll` instance, one ready
    /// set processed per wakeup, no work handed off to other threads.
    pub fn run(mut self, mut poll: Poll) -> Result<()> {
        let mut events = Events::with_capacity(EVENTS_CAPACITY);

        loop {
            match poll.poll(&mut events, Some(POLL_TIMEOUT)) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }

            for event in events.iter() {
                if let Err(e) = self.dispatch(&poll, event) {
                    errors!("error handling event on {:?}: {}", event.token(), e);
                }
            }

            timeouts::process(&mut self, &poll);
            self.reap_zombies();

            if self.shutdown.load(Ordering::Relaxed) {
                self.begin_shutdown(&poll);
                if self.connections.is_empty() && self.zombie_purgatory.is_empty() {
                    info!("all connections drained, exiting");
                    return Ok(());
                }
            }
        }
    }

    /// Stops accepting new connections but leaves in-flight ones to finish
    /// on their own; `run` keeps polling until they drain.
    fn begin_shutdown(&mut self, poll: &Poll) {
        if self.listeners.is_empty() {
            return;
        }
        info!("shutdown signal received, no longer accepting connections");
        for (_, mut listener) in self.listeners.drain() {
            let _ = poll.registry().deregister(&mut listener);
        }
        self.listener_configs.clear();
    }

    fn dispatch(&mut self, poll: &Poll, event: &Event) -> Result<()> {
        let token = event.token();

        if self.listeners.contains_key(&token) {
            self.accept_connections(poll, token)?;
            return Ok(());
        }

        if let Some(&client_token) = self.cgi_to_client.get(&token) {
            let mut should_close = false;
            if let Some(conn) = self.connections.get_mut(&client_token) {
                cgi::handle_cgi_event(
                    poll,
                    event,
                    token,
                    client_token,
                    conn,
                    &mut self.cgi_to_client,
                )?;
                should_close = conn.should_close();
            }
            if should_close {
                HttpConnection::terminate_connection(self, client_token);
            }
            return Ok(());
        }

        if self.connections.contains_key(&token) {
            let mut should_close = false;
            if let Some(conn) = self.connections.get_mut(&token) {
                if event.is_readable() {
                    HttpConnection::handle_read_phase(
                        conn,
                        poll,
                        token,
                        &mut self.next_token,
                        &mut self.cgi_to_client,
                    )?;
                }
                if !conn.should_close() && event.is_writable() {
                    HttpConnection::handle_write_phase(
                        conn,
                        poll,
                        token,
                        &mut self.next_token,
                        &mut self.cgi_to_client,
                    )?;
                }
                should_close = conn.should_close();
            }
            if should_close {
                HttpConnection::terminate_connection(self, token);
            }
        }

        Ok(())
    }

    fn accept_connections(&mut self, poll: &Poll, listener_token: Token) -> Result<()> {
        loop {
            let Some(listener) = self.listeners.get_mut(&listener_token) else {
                break;
            };

            match listener.accept() {
                Ok((mut stream, addr)) => {
                    let configs = self
                        .listener_configs
                        .get(&listener_token)
                        .cloned()
                        .unwrap_or_default();

                    let token = Token(self.next_token);
                    self.next_token += 1;

                    poll.registry()
                        .register(&mut stream, token, Interest::READABLE)?;

                    trace!("accepted connection from {} as {:?}", addr, token);
                    self.connections
                        .insert(token, HttpConnection::new(stream, configs));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("accept failed on {:?}: {}", listener_token, e);
                    break;
                }
            }
        }
        Ok(())
    }

    fn reap_zombies(&mut self) {
        self.zombie_purgatory
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }
}
